//! 简历 DTO
//!
//! `GET /api/cv/summary` 的精简视图

use serde::{Deserialize, Serialize};

use crate::models::profile::KnowledgeProfile;

/// 联系方式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactDto {
    pub email: String,
    pub linkedin: String,
    pub github: String,
}

/// 简历摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvSummaryResponse {
    /// 姓名
    pub name: String,

    /// 职位
    pub title: String,

    /// 工作经历概述
    pub experience: String,

    /// 前 5 项技能
    pub top_skills: Vec<String>,

    /// 最近项目名称
    pub recent_projects: Vec<String>,

    pub contact: ContactDto,
}

impl From<&KnowledgeProfile> for CvSummaryResponse {
    fn from(profile: &KnowledgeProfile) -> Self {
        let personal = &profile.personal;
        Self {
            name: personal.name.clone(),
            title: personal.title.clone(),
            experience: profile.experience_summary(),
            top_skills: profile.top_skills(5).into_iter().map(String::from).collect(),
            recent_projects: profile
                .recent_projects(3)
                .into_iter()
                .map(String::from)
                .collect(),
            contact: ContactDto {
                email: personal.email.clone(),
                linkedin: personal.linkedin.clone(),
                github: personal.github.clone(),
            },
        }
    }
}
