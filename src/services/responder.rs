//! 关键词规则应答
//!
//! 两张规则表：
//! - 助手表：动态层（读取简历）优先于静态层（固定模板），本地模式下的主应答
//! - 兜底表：远程模型不可用时按问题类别给出第一人称段落

use std::sync::Arc;

use crate::models::pattern::{PatternRule, Producer, RuleId};
use crate::models::profile::KnowledgeProfile;

const ASSISTANT_DYNAMIC_RULES: &[PatternRule] = &[
    PatternRule::dynamic(
        RuleId::Skills,
        &["skills", "technologies", "tech stack", "programming languages", "what can you do"],
        Producer::SkillsOverview { fetch: 8, shown: 6 },
    ),
    PatternRule::dynamic(
        RuleId::Experience,
        &["experience", "years", "work", "career", "background", "resume"],
        Producer::ExperienceOverview,
    ),
    PatternRule::dynamic(
        RuleId::Projects,
        &["projects", "portfolio", "demos", "examples", "work samples"],
        Producer::ProjectHighlights { count: 3 },
    ),
    PatternRule::dynamic(
        RuleId::CurrentRole,
        &["current job", "current role", "latest work", "recent work"],
        Producer::LatestRole,
    ),
    PatternRule::dynamic(
        RuleId::Education,
        &["education", "degree", "university", "college", "studies"],
        Producer::EducationSummary,
    ),
];

const ASSISTANT_STATIC_RULES: &[PatternRule] = &[
    PatternRule::fixed(
        RuleId::Greeting,
        &["hello", "hi", "hey", "good morning", "good afternoon"],
        "👋 Hello! I'm {first_name}'s AI assistant. I can tell you about {first_name}'s \
         experience with Rust, APIs, databases, and more. What would you like to know?",
    ),
    PatternRule::fixed(
        RuleId::Skills,
        &["skills", "technologies", "tech stack", "programming languages", "what can you do"],
        "🚀 {first_name} specializes in:\n\
         • Rust & async services (Tokio, Axum)\n\
         • REST APIs & web services\n\
         • PostgreSQL and SQLite\n\
         • Containers and Kubernetes\n\
         • Legacy system modernization\n\
         • Observability & performance tuning",
    ),
    PatternRule::fixed(
        RuleId::Experience,
        &["experience", "years", "work", "career", "background", "resume"],
        "💼 {first_name} has hands-on experience in:\n\
         • Replacing legacy desktop tools with HTTP services\n\
         • Building scalable Rust APIs with async I/O\n\
         • Database schema design and query optimization\n\
         • Cloud deployment and CI/CD\n\
         • Payment and logistics back ends",
    ),
    PatternRule::fixed(
        RuleId::Projects,
        &["projects", "portfolio", "demos", "examples", "work samples"],
        "🎯 Check out these projects:\n\
         • **This chat service** - Rust + Axum with moderation and fallbacks\n\
         • **Tracking Event Pipeline** - streaming ingestion into PostgreSQL\n\
         • **Ledger Reconciler** - nightly settlement checks\n\
         \nAsk about any of them for details!",
    ),
    PatternRule::fixed(
        RuleId::CoreLanguage,
        &["rust", "cargo", "tokio", "axum"],
        "⚡ {first_name}'s Rust toolbox includes:\n\
         • Async services with Tokio and Axum\n\
         • Strongly typed APIs with serde\n\
         • Structured logging with tracing\n\
         • Property and integration testing\n\
         • Profiling and latency work",
    ),
    PatternRule::fixed(
        RuleId::Databases,
        &["database", "sql", "sqlite", "postgres", "data"],
        "🗃️ Database expertise:\n\
         • PostgreSQL (indexing, query plans, partitioning)\n\
         • SQLite for embedded and edge workloads\n\
         • Schema migrations without downtime\n\
         • Performance tuning for read-heavy APIs",
    ),
    PatternRule::fixed(
        RuleId::Cloud,
        &["azure", "aws", "cloud", "deployment", "hosting", "devops"],
        "☁️ Cloud & DevOps skills:\n\
         • Container images and Kubernetes deployments\n\
         • CI/CD pipelines\n\
         • Infrastructure as Code\n\
         • Metrics, tracing and alerting",
    ),
    PatternRule::fixed(
        RuleId::Contact,
        &["contact", "hire", "email", "linkedin", "github", "reach out"],
        "📞 Ready to connect with {first_name}?\n\
         • **Email**: {email}\n\
         • **LinkedIn**: {linkedin}\n\
         • **GitHub**: {github}\n\
         \n{first_name} is actively looking for new opportunities!",
    ),
    PatternRule::fixed(
        RuleId::Availability,
        &["available", "looking", "job", "opportunity", "hiring", "work"],
        "✅ **Yes, {first_name} is actively seeking new opportunities!**\n\
         Particularly interesting:\n\
         • Rust backend roles\n\
         • API and platform projects\n\
         • Legacy system modernization\n\
         \nReady to start soon!",
    ),
    PatternRule::fixed(
        RuleId::Demo,
        &["demo", "try", "test", "api"],
        "🧪 This chat itself is the demo! It showcases:\n\
         • An Axum HTTP API\n\
         • Content moderation before any model call\n\
         • A remote language model with local fallbacks\n\
         • Structured logging and metrics",
    ),
    PatternRule::fixed(
        RuleId::AboutBot,
        &["how do you work", "ai", "chatbot", "bot"],
        "🤖 I'm a small assistant written in Rust!\n\
         • Keyword rules for quick answers\n\
         • An optional language model for everything else\n\
         • Safe fallbacks when the model is unavailable",
    ),
];

const FALLBACK_DYNAMIC_RULES: &[PatternRule] = &[
    PatternRule::dynamic(RuleId::Skills, &["skill", "technology", "tech"], Producer::SkillsPitch),
    PatternRule::dynamic(
        RuleId::Experience,
        &["experience", "work", "job", "career"],
        Producer::ExperiencePitch,
    ),
    PatternRule::dynamic(
        RuleId::Availability,
        &["available", "hire", "opportunity"],
        Producer::AvailabilityPitch,
    ),
    PatternRule::dynamic(RuleId::Contact, &["contact", "reach", "email"], Producer::ContactCard),
    PatternRule::dynamic(
        RuleId::Projects,
        &["project", "demo", "portfolio"],
        Producer::ProjectsPitch,
    ),
];

const FALLBACK_STATIC_RULES: &[PatternRule] = &[
    PatternRule::fixed(
        RuleId::Compensation,
        &["salary", "rate", "cost"],
        "💬 I'm open to discussing compensation based on the role and responsibilities. \
         I believe in fair market rates that reflect the value delivered. \
         Let's talk about the opportunity first!",
    ),
    PatternRule::fixed(
        RuleId::Greeting,
        &["hello", "hi", "hey"],
        "👋 Hello! Great to meet you! I'm {first_name}'s AI assistant. I can tell you about \
         backend expertise, work experience, projects, or anything else you'd like to know. \
         What interests you most?",
    ),
];

/// 建议问题，顺序即展示顺序
pub const SUGGESTED_QUESTIONS: &[&str] = &[
    "What are your main technical skills?",
    "Tell me about your Rust experience",
    "What projects have you worked on recently?",
    "Are you available for new opportunities?",
    "What's your experience with cloud technologies?",
    "How many years of experience do you have?",
    "What databases do you work with?",
    "Tell me about your API development experience",
    "What's your strongest programming language?",
    "How can I contact you?",
    "What kind of role are you looking for?",
    "What's your experience with Kubernetes?",
];

/// 远程模式下无类别命中时的通用回复
pub const DEFLECTIONS: &[&str] = &[
    "🤔 That's an interesting question! I'd be happy to help. Could you ask about my technical skills, work experience, or current availability?",
    "💡 I can share details about my backend development experience, recent projects, or how to get in touch. What would be most helpful?",
    "🚀 Feel free to ask about my programming expertise, database skills, cloud experience, or anything else!",
];

/// 本地模式下无规则命中时的默认回复
pub const DEFAULT_REPLIES: &[&str] = &[
    "🤔 I'm not sure about that specific question, but I can tell you about Rust expertise, projects, or availability!",
    "💡 Try asking about skills, experience, or projects. I have lots of information to share!",
    "🚀 I can help you learn about backend development experience, cloud skills, or current projects!",
    "📋 Ask me about technical skills, work experience, or how to get in touch!",
];

/// 关键词规则应答器
#[derive(Debug, Clone)]
pub struct PatternResponder {
    profile: Arc<KnowledgeProfile>,
    dynamic_rules: Vec<PatternRule>,
    static_rules: Vec<PatternRule>,
}

impl PatternResponder {
    pub fn new(
        profile: Arc<KnowledgeProfile>,
        dynamic_rules: &[PatternRule],
        static_rules: &[PatternRule],
    ) -> Self {
        Self {
            profile,
            dynamic_rules: dynamic_rules.to_vec(),
            static_rules: static_rules.to_vec(),
        }
    }

    /// 助手规则表（本地模式）
    pub fn assistant(profile: Arc<KnowledgeProfile>) -> Self {
        Self::new(profile, ASSISTANT_DYNAMIC_RULES, ASSISTANT_STATIC_RULES)
    }

    /// 兜底规则表（远程失败时）
    pub fn fallback(profile: Arc<KnowledgeProfile>) -> Self {
        Self::new(profile, FALLBACK_DYNAMIC_RULES, FALLBACK_STATIC_RULES)
    }

    /// 按优先级遍历全部规则
    pub fn rules(&self) -> impl Iterator<Item = &PatternRule> {
        self.dynamic_rules.iter().chain(self.static_rules.iter())
    }

    /// 第一条命中的规则
    pub fn match_rule(&self, message: &str) -> Option<&PatternRule> {
        let normalized = message.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        self.rules().find(|rule| rule.matches(&normalized))
    }

    /// 命中时返回渲染后的回复，`None` 表示无匹配
    pub fn respond(&self, message: &str) -> Option<String> {
        self.match_rule(message)
            .map(|rule| self.render(&rule.producer))
    }

    /// 按当前简历渲染产出
    pub fn render(&self, producer: &Producer) -> String {
        let profile = self.profile.as_ref();
        let first_name = self.first_name();

        match *producer {
            Producer::SkillsOverview { fetch, shown } => {
                let skills = profile.top_skills(fetch);
                let mut text = skills
                    .iter()
                    .take(shown)
                    .copied()
                    .collect::<Vec<_>>()
                    .join(", ");
                if skills.len() > shown {
                    text.push_str(", and more!");
                }
                format!(
                    "🚀 {}'s core skills include:\n{}\n\nThe focus is modern backend development and reliable infrastructure.",
                    first_name, text
                )
            }
            Producer::ExperienceOverview => format!(
                "💼 {}\n\n**Current Role**: {}\n\nThe focus is on modernizing legacy systems and building scalable backend services.",
                profile.experience_summary(),
                profile.latest_role()
            ),
            Producer::ProjectHighlights { count } => {
                let projects = profile.recent_projects(count);
                if projects.is_empty() {
                    return "🎯 Project details are available on request.".to_string();
                }
                let list = projects
                    .iter()
                    .map(|name| format!("**{}**", name))
                    .collect::<Vec<_>>()
                    .join("\n• ");
                format!(
                    "🎯 Recent projects include:\n• {}\n\nThis chat is one of them, so feel free to try it out!",
                    list
                )
            }
            Producer::LatestRole => format!(
                "💼 **Latest Role**: {}\n\nExperienced in backend development with a focus on APIs and cloud deployment.",
                profile.latest_role()
            ),
            Producer::EducationSummary => match profile.first_education() {
                Some(edu) => format!(
                    "🎓 **Education**: {} in {}\n📍 {} ({})",
                    edu.degree, edu.field, edu.institution, edu.duration
                ),
                None => format!(
                    "🎓 {} has a strong educational background in software development and keeps learning through practical projects and certifications.",
                    first_name
                ),
            },
            Producer::SkillsPitch => format!(
                "🚀 I specialize in {}. I'm experienced in async services, API design, and modernizing legacy applications. Want to know about any specific technology?",
                profile.top_skills(8).join(", ")
            ),
            Producer::ExperiencePitch => {
                let mut text = format!(
                    "💼 I have {}+ years of experience building backend systems.",
                    profile.years_of_experience()
                );
                if !profile.personal.summary.is_empty() {
                    text.push(' ');
                    text.push_str(&profile.personal.summary);
                }
                text.push_str(&format!(
                    " Right now I'm {}. This portfolio chat showcases my current skills!",
                    profile.latest_role()
                ));
                text
            }
            Producer::AvailabilityPitch => {
                let availability = if profile.personal.availability.is_empty() {
                    "I'm open to new opportunities."
                } else {
                    profile.personal.availability.as_str()
                };
                format!(
                    "✅ Yes! {} I'm particularly interested in backend development, API projects, and cloud solutions. Contact me at {}",
                    availability, profile.personal.email
                )
            }
            Producer::ProjectsPitch => {
                if profile.projects.is_empty() {
                    return "🎯 Project details are available on request.".to_string();
                }
                let list = profile
                    .projects
                    .iter()
                    .take(3)
                    .map(|p| format!("• **{}** - {}", p.name, p.description))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("🎯 Some of my recent work:\n{}\n\nAsk me about any of them!", list)
            }
            Producer::ContactCard => {
                let p = &profile.personal;
                let lines = [("Email", &p.email), ("LinkedIn", &p.linkedin), ("GitHub", &p.github)]
                    .iter()
                    .filter(|(_, value)| !value.is_empty())
                    .map(|(label, value)| format!("• **{}**: {}", label, value))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!(
                    "📫 You can reach me at:\n{}\n\nI typically respond within a few hours!",
                    lines
                )
            }
            Producer::Template(template) => self.fill_template(template),
        }
    }

    /// 建议问题列表
    pub fn suggestions(&self) -> &'static [&'static str] {
        SUGGESTED_QUESTIONS
    }

    pub fn first_name(&self) -> &str {
        self.profile
            .personal
            .name
            .split_whitespace()
            .next()
            .unwrap_or("the owner")
    }

    fn fill_template(&self, template: &str) -> String {
        let p = &self.profile.personal;
        template
            .replace("{first_name}", self.first_name())
            .replace("{name}", &p.name)
            .replace("{email}", &p.email)
            .replace("{linkedin}", &p.linkedin)
            .replace("{github}", &p.github)
    }
}
