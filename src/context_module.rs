//! Supplemental context module loading (A5): caller-supplied domain
//! knowledge files that get folded into curated context alongside
//! articles, grouped by type and trimmed to fit the curator's token
//! budget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::token_budget::estimate_tokens;

/// The four groupings a module can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    Core,
    DomainKnowledge,
    Supplemental,
    Historical,
}

/// One unit of supplemental context, such as a standing brief on local
/// zoning rules or a glossary of recurring acronyms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextModule {
    pub name: String,
    pub description: String,
    pub content: String,
    pub priority: u32,
    pub module_type: ModuleType,
    pub last_updated: DateTime<Utc>,
}

impl ContextModule {
    pub fn token_estimate(&self) -> usize {
        estimate_tokens(&self.content)
    }
}

/// Group modules by `module_type`. Modules whose name contains
/// "decision_context" are reported separately so callers (the context
/// curator, C13) can fold them into a dedicated `decision_context` slot
/// rather than the generic domain-knowledge bucket.
pub fn group_modules(modules: &[ContextModule]) -> GroupedModules<'_> {
    let mut grouped = GroupedModules::default();
    for module in modules {
        if module.name.to_lowercase().contains("decision_context") {
            grouped.decision_context.push(module);
            continue;
        }
        match module.module_type {
            ModuleType::Core => grouped.core.push(module),
            ModuleType::DomainKnowledge => grouped.domain_knowledge.push(module),
            ModuleType::Supplemental => grouped.supplemental.push(module),
            ModuleType::Historical => grouped.historical.push(module),
        }
    }
    grouped
}

#[derive(Debug, Default)]
pub struct GroupedModules<'a> {
    pub core: Vec<&'a ContextModule>,
    pub domain_knowledge: Vec<&'a ContextModule>,
    pub supplemental: Vec<&'a ContextModule>,
    pub historical: Vec<&'a ContextModule>,
    pub decision_context: Vec<&'a ContextModule>,
}

/// Render a set of modules as a `<domain_knowledge>`-wrapped block of
/// markdown, filling from highest priority down until `budget_tokens`
/// would be exceeded.
pub fn format_for_context(modules: &[&ContextModule], budget_tokens: usize) -> String {
    let mut sorted: Vec<&&ContextModule> = modules.iter().collect();
    sorted.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut used = 0usize;
    let mut sections = Vec::new();
    for module in sorted {
        let estimate = module.token_estimate();
        if used + estimate > budget_tokens {
            continue;
        }
        used += estimate;
        sections.push(format!("### {}\n{}", module.name, module.content));
    }

    if sections.is_empty() {
        return String::new();
    }
    format!("<domain_knowledge>\n{}\n</domain_knowledge>", sections.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, module_type: ModuleType, priority: u32, content: &str) -> ContextModule {
        ContextModule {
            name: name.to_string(),
            description: String::new(),
            content: content.to_string(),
            priority,
            module_type,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn decision_context_modules_are_grouped_separately_by_name() {
        let modules = vec![
            module("local_decision_context", ModuleType::Supplemental, 5, "x"),
            module("zoning_glossary", ModuleType::DomainKnowledge, 5, "y"),
        ];
        let grouped = group_modules(&modules);
        assert_eq!(grouped.decision_context.len(), 1);
        assert_eq!(grouped.domain_knowledge.len(), 1);
    }

    #[test]
    fn formatting_respects_priority_and_budget() {
        let high = module("high", ModuleType::DomainKnowledge, 10, "important stuff here");
        let low = module("low", ModuleType::DomainKnowledge, 1, "less important stuff here too");
        let modules = vec![&high, &low];
        let budget = high.token_estimate();
        let rendered = format_for_context(&modules, budget);
        assert!(rendered.contains("important stuff"));
        assert!(!rendered.contains("less important"));
    }

    #[test]
    fn empty_module_list_renders_empty_string() {
        assert_eq!(format_for_context(&[], 1000), "");
    }
}
