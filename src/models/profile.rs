//! 简历知识库数据模型
//!
//! 进程启动时构建一次，之后只读，由所有请求共享。

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::KnowledgeConfig;
use crate::error::{AppError, Result};

/// 当简历中没有工作经历时 `latest_role` 返回的占位文本
pub const ROLE_UNAVAILABLE: &str = "Current role information available upon request";

/// 简历知识库
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeProfile {
    /// 个人信息
    pub personal: PersonalInfo,

    /// 工作经历，最近的在前
    #[serde(default)]
    pub experience: Vec<WorkExperience>,

    /// 教育经历
    #[serde(default)]
    pub education: Vec<Education>,

    /// 技能列表，顺序即优先级
    #[serde(default)]
    pub skills: Vec<String>,

    /// 项目列表，最近的在前
    #[serde(default)]
    pub projects: Vec<Project>,

    /// 证书
    #[serde(default)]
    pub certifications: Vec<String>,
}

/// 个人信息
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PersonalInfo {
    pub name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
    pub location: String,
    pub summary: String,
    /// 求职状态描述
    pub availability: String,
    /// 从业年限
    pub years_of_experience: u32,
}

/// 工作经历
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorkExperience {
    pub company: String,
    pub position: String,
    pub duration: String,
    pub location: String,
    pub responsibilities: Vec<String>,
    pub technologies: Vec<String>,
    pub achievements: Vec<String>,
}

/// 教育经历
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub duration: String,
    pub grade: String,
}

/// 项目
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub duration: String,
    pub link: String,
    pub highlights: Vec<String>,
}

impl KnowledgeProfile {
    /// 按配置加载：配置了 `profile_path` 时读取文件，否则使用内置简历
    pub fn load(config: &KnowledgeConfig) -> Result<Self> {
        match &config.profile_path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }

    /// 从 JSON 文件读取简历
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let profile: Self = serde_json::from_str(&raw)?;

        if profile.personal.name.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Profile at {} has no name",
                path.as_ref().display()
            )));
        }

        Ok(profile)
    }

    /// 内置简历
    pub fn builtin() -> Self {
        Self {
            personal: PersonalInfo {
                name: "Jordan Avery".into(),
                title: "Backend Engineer · Rust · APIs · Databases".into(),
                email: "jordan@averyworks.example".into(),
                phone: String::new(),
                linkedin: "linkedin.com/in/jordan-avery-dev".into(),
                github: "github.com/jordan-avery-dev".into(),
                location: "Remote (UTC+1)".into(),
                summary: "Backend engineer who turns slow, fragile legacy systems into fast, \
                          well-tested HTTP services. Most at home with Rust, PostgreSQL and \
                          boringly reliable infrastructure."
                    .into(),
                availability: "Actively seeking new opportunities in backend and systems development."
                    .into(),
                years_of_experience: 6,
            },
            experience: vec![
                WorkExperience {
                    company: "Northwind Logistics".into(),
                    position: "Senior Backend Engineer".into(),
                    duration: "2022 - Present".into(),
                    location: "Remote".into(),
                    responsibilities: vec![
                        "Design and operate Rust services behind the shipment tracking API".into(),
                        "Own the PostgreSQL schema and query performance for tracking data".into(),
                        "Migrate batch jobs from a legacy desktop tool to async workers".into(),
                    ],
                    technologies: vec![
                        "Rust".into(),
                        "Tokio".into(),
                        "Axum".into(),
                        "PostgreSQL".into(),
                        "Kubernetes".into(),
                    ],
                    achievements: vec![
                        "Cut p99 tracking lookup latency from 900ms to 40ms".into(),
                        "Retired a 15-year-old desktop scheduler without downtime".into(),
                    ],
                },
                WorkExperience {
                    company: "Brightline Payments".into(),
                    position: "Software Engineer".into(),
                    duration: "2019 - 2022".into(),
                    location: "Lisbon".into(),
                    responsibilities: vec![
                        "Built payment reconciliation services and REST APIs".into(),
                        "Maintained CI/CD pipelines and container images".into(),
                    ],
                    technologies: vec![
                        "Go".into(),
                        "Rust".into(),
                        "PostgreSQL".into(),
                        "Docker".into(),
                    ],
                    achievements: vec![
                        "Reduced reconciliation run time by 70% through streaming processing".into(),
                    ],
                },
            ],
            education: vec![Education {
                institution: "University of Porto".into(),
                degree: "BSc".into(),
                field: "Computer Science".into(),
                duration: "2015 - 2019".into(),
                grade: String::new(),
            }],
            skills: vec![
                "Rust".into(),
                "Tokio".into(),
                "Axum".into(),
                "PostgreSQL".into(),
                "REST APIs".into(),
                "SQLite".into(),
                "Docker".into(),
                "Kubernetes".into(),
                "Go".into(),
                "CI/CD".into(),
                "Observability (tracing, Prometheus)".into(),
                "Async/Await".into(),
            ],
            projects: vec![
                Project {
                    name: "Portfolio Chat Service".into(),
                    description: "This portfolio's chat backend: moderated, cached and fail-safe \
                                  answers about my work"
                        .into(),
                    technologies: vec!["Rust".into(), "Axum".into(), "Tokio".into()],
                    duration: "2025".into(),
                    link: String::new(),
                    highlights: vec![
                        "Content moderation before any model call".into(),
                        "Falls back to local answers when the model is unreachable".into(),
                    ],
                },
                Project {
                    name: "Tracking Event Pipeline".into(),
                    description: "Streaming ingestion of carrier events into PostgreSQL".into(),
                    technologies: vec!["Rust".into(), "PostgreSQL".into(), "Kafka".into()],
                    duration: "2023".into(),
                    link: String::new(),
                    highlights: vec!["Processes 20k events per second on two cores".into()],
                },
                Project {
                    name: "Ledger Reconciler".into(),
                    description: "Nightly reconciliation of card settlements against the ledger"
                        .into(),
                    technologies: vec!["Go".into(), "PostgreSQL".into()],
                    duration: "2021".into(),
                    link: String::new(),
                    highlights: vec![],
                },
            ],
            certifications: vec![],
        }
    }

    /// 前 `count` 项技能（保持插入顺序）
    pub fn top_skills(&self, count: usize) -> Vec<&str> {
        self.skills.iter().take(count).map(String::as_str).collect()
    }

    /// 最近一份工作，格式为 `Position at Company (Duration)`
    pub fn latest_role(&self) -> String {
        match self.experience.first() {
            Some(job) => format!("{} at {} ({})", job.position, job.company, job.duration),
            None => ROLE_UNAVAILABLE.to_string(),
        }
    }

    /// 最近 `count` 个项目名称
    pub fn recent_projects(&self, count: usize) -> Vec<&str> {
        self.projects
            .iter()
            .take(count)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// 从业年限，没有工作经历时为 0
    pub fn years_of_experience(&self) -> u32 {
        if self.experience.is_empty() {
            0
        } else {
            self.personal.years_of_experience
        }
    }

    /// 一句话经历概述
    pub fn experience_summary(&self) -> String {
        format!(
            "{} has {}+ years of experience in software development, specializing in {}.",
            self.personal.name,
            self.years_of_experience(),
            self.top_skills(3).join(", ")
        )
    }

    pub fn first_education(&self) -> Option<&Education> {
        self.education.first()
    }

    /// 远程摘要不可用时使用的内置知识摘要
    pub fn default_summary(&self) -> String {
        let p = &self.personal;
        let mut out = format!("{} is a {}.\n\n", p.name, p.title);

        if !p.summary.is_empty() {
            out.push_str(&format!("EXPERIENCE: {}", p.summary));
            if let Some(job) = self.experience.first() {
                out.push_str(&format!(" Currently {}.", self.latest_role()));
                if let Some(win) = job.achievements.first() {
                    out.push_str(&format!(" Recent win: {}.", win));
                }
            }
            out.push_str("\n\n");
        }

        if !self.skills.is_empty() {
            out.push_str(&format!("SKILLS: {}.\n\n", self.skills.join(", ")));
        }

        if let Some(project) = self.projects.first() {
            out.push_str(&format!(
                "CURRENT PROJECT: {} - {}.\n\n",
                project.name, project.description
            ));
        }

        if !p.availability.is_empty() {
            out.push_str(&format!("AVAILABILITY: {}\n\n", p.availability));
        }

        out.push_str(&format!("CONTACT: {}", self.contact_line()));
        out
    }

    /// `Email x, LinkedIn y, GitHub z`，省略空字段
    pub fn contact_line(&self) -> String {
        let p = &self.personal;
        [("Email", &p.email), ("LinkedIn", &p.linkedin), ("GitHub", &p.github)]
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(label, value)| format!("{} {}", label, value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
