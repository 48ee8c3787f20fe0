//! 关键词规则数据模型
//!
//! 规则表只包含数据：规则 ID、触发关键词和产出方式。
//! 产出方式由 `services::responder` 根据简历渲染。

use serde::Serialize;

/// 规则层级，动态层优先于静态层
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTier {
    /// 运行时从简历计算
    Dynamic,
    /// 固定模板
    Static,
}

/// 规则标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    Greeting,
    Skills,
    Experience,
    Projects,
    CurrentRole,
    Education,
    CoreLanguage,
    Databases,
    Cloud,
    Contact,
    Availability,
    Compensation,
    Demo,
    AboutBot,
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RuleId::Greeting => "greeting",
            RuleId::Skills => "skills",
            RuleId::Experience => "experience",
            RuleId::Projects => "projects",
            RuleId::CurrentRole => "current_role",
            RuleId::Education => "education",
            RuleId::CoreLanguage => "core_language",
            RuleId::Databases => "databases",
            RuleId::Cloud => "cloud",
            RuleId::Contact => "contact",
            RuleId::Availability => "availability",
            RuleId::Compensation => "compensation",
            RuleId::Demo => "demo",
            RuleId::AboutBot => "about_bot",
        };
        write!(f, "{}", name)
    }
}

/// 回复产出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "args", rename_all = "snake_case")]
pub enum Producer {
    /// 取前 `fetch` 项技能，展示前 `shown` 项
    SkillsOverview { fetch: usize, shown: usize },
    /// 从业年限加最近职位
    ExperienceOverview,
    /// 最近 `count` 个项目
    ProjectHighlights { count: usize },
    /// 最近职位
    LatestRole,
    /// 第一条教育经历
    EducationSummary,
    /// 第一人称技能介绍
    SkillsPitch,
    /// 第一人称经历介绍
    ExperiencePitch,
    /// 第一人称求职状态，附联系邮箱
    AvailabilityPitch,
    /// 第一人称项目介绍
    ProjectsPitch,
    /// 联系方式卡片
    ContactCard,
    /// 固定模板，支持 `{name}` `{first_name}` `{email}` `{linkedin}` `{github}` 占位符
    Template(&'static str),
}

/// 关键词规则
#[derive(Debug, Clone, Serialize)]
pub struct PatternRule {
    pub id: RuleId,
    pub tier: RuleTier,
    /// 小写触发词，任一子串命中即匹配
    pub keywords: &'static [&'static str],
    pub producer: Producer,
}

impl PatternRule {
    pub const fn dynamic(
        id: RuleId,
        keywords: &'static [&'static str],
        producer: Producer,
    ) -> Self {
        Self {
            id,
            tier: RuleTier::Dynamic,
            keywords,
            producer,
        }
    }

    pub const fn fixed(id: RuleId, keywords: &'static [&'static str], template: &'static str) -> Self {
        Self {
            id,
            tier: RuleTier::Static,
            keywords,
            producer: Producer::Template(template),
        }
    }

    /// `normalized` 须已转小写
    pub fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|kw| normalized.contains(kw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_matches_any_keyword_substring() {
        let rule = PatternRule::dynamic(
            RuleId::Skills,
            &["skills", "tech stack"],
            Producer::SkillsOverview { fetch: 8, shown: 6 },
        );

        assert!(rule.matches("what is your tech stack?"));
        assert!(rule.matches("list your skillset"));
        assert!(!rule.matches("where do you live?"));
    }

    #[test]
    fn test_rule_serializes_as_data() {
        let rule = PatternRule::fixed(RuleId::Greeting, &["hello"], "Hi, I'm {name}'s assistant.");
        let json = serde_json::to_value(&rule).unwrap();

        assert_eq!(json["id"], "greeting");
        assert_eq!(json["tier"], "static");
        assert_eq!(json["keywords"][0], "hello");
        assert_eq!(json["producer"]["kind"], "template");
    }
}
