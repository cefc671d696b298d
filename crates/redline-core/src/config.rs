//! Per-definition check configuration.
//!
//! Each definition owns an immutable [`CheckConfig`] merged from its static
//! defaults and caller overrides. Overrides arrive as a partial
//! [`ConfigOverride`] (deserializable from host-supplied JSON) and win
//! field-wise.

use serde::Deserialize;

use crate::document::Document;
use crate::section::section_key;

/// Which editing event causes a re-derivation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerContext {
    /// Continuous, debounced evaluation as the document changes.
    DocumentChange,
    /// One-shot, synchronous evaluation gating a save attempt.
    BeforeSave,
}

/// How the review session was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    Check,
    Suggestion,
}

/// Account requirement for a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountGate {
    LoggedIn,
    LoggedOut,
}

/// The acting user, as far as gating cares.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub logged_in: bool,
    pub edit_count: u32,
}

/// Section allow-list: everything, or only the named sections.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionFilter {
    All,
    Listed(Vec<String>),
}

impl Default for SectionFilter {
    fn default() -> Self {
        SectionFilter::All
    }
}

impl<'de> Deserialize<'de> for SectionFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Star(String),
            List(Vec<String>),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Star(s) if s == "*" => Ok(SectionFilter::All),
            Raw::Star(other) => Err(serde::de::Error::custom(format!(
                "expected \"*\" or a section list, got {other:?}"
            ))),
            Raw::List(list) => Ok(SectionFilter::Listed(list)),
        }
    }
}

/// Shared configuration every check definition carries.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckConfig {
    pub enabled: bool,
    pub account: Option<AccountGate>,
    pub minimum_editcount: Option<u32>,
    pub maximum_editcount: Option<u32>,
    pub ignore_sections: Vec<String>,
    pub include_sections: SectionFilter,
    pub ignore_lead_section: bool,
    pub ignore_disambiguation_pages: bool,
    pub ignore_quoted_content: bool,
    pub ignore_categories: Vec<String>,
    pub ignore_templates: Vec<String>,
    pub triggers: Vec<TriggerContext>,
    pub modes: Vec<SessionMode>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            account: None,
            minimum_editcount: None,
            maximum_editcount: None,
            ignore_sections: Vec::new(),
            include_sections: SectionFilter::All,
            ignore_lead_section: false,
            ignore_disambiguation_pages: true,
            ignore_quoted_content: true,
            ignore_categories: Vec::new(),
            ignore_templates: Vec::new(),
            triggers: vec![TriggerContext::DocumentChange, TriggerContext::BeforeSave],
            modes: vec![SessionMode::Check],
        }
    }
}

impl CheckConfig {
    /// Session-level gate: enabled, mode, account status, edit count.
    pub fn matches(&self, user: &UserProfile, mode: SessionMode) -> bool {
        if !self.enabled {
            return false;
        }
        if !self.modes.contains(&mode) {
            return false;
        }
        match self.account {
            Some(AccountGate::LoggedIn) if !user.logged_in => return false,
            Some(AccountGate::LoggedOut) if user.logged_in => return false,
            _ => {}
        }
        if let Some(min) = self.minimum_editcount {
            if user.edit_count < min {
                return false;
            }
        }
        if let Some(max) = self.maximum_editcount {
            if user.edit_count > max {
                return false;
            }
        }
        true
    }

    /// Document-level gate: disambiguation pages, category and template
    /// membership. Callers cache the answer per document revision.
    pub fn covers_document(&self, doc: &Document) -> bool {
        if self.ignore_disambiguation_pages && doc.is_disambiguation() {
            return false;
        }
        if self
            .ignore_categories
            .iter()
            .any(|c| doc.categories().iter().any(|d| section_key(d) == section_key(c)))
        {
            return false;
        }
        if self
            .ignore_templates
            .iter()
            .any(|t| doc.templates().iter().any(|d| section_key(d) == section_key(t)))
        {
            return false;
        }
        true
    }

    /// Whether this definition runs for `trigger`.
    pub fn runs_on(&self, trigger: TriggerContext) -> bool {
        self.triggers.contains(&trigger)
    }
}

/// Partial override; set fields replace the corresponding config fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigOverride {
    pub enabled: Option<bool>,
    pub account: Option<AccountGate>,
    pub minimum_editcount: Option<u32>,
    pub maximum_editcount: Option<u32>,
    pub ignore_sections: Option<Vec<String>>,
    pub include_sections: Option<SectionFilter>,
    pub ignore_lead_section: Option<bool>,
    pub ignore_disambiguation_pages: Option<bool>,
    pub ignore_quoted_content: Option<bool>,
    pub ignore_categories: Option<Vec<String>>,
    pub ignore_templates: Option<Vec<String>>,
    pub triggers: Option<Vec<TriggerContext>>,
    pub modes: Option<Vec<SessionMode>>,
}

impl ConfigOverride {
    /// Merge this override onto `config`, field-wise.
    pub fn apply(&self, config: &mut CheckConfig) {
        if let Some(v) = self.enabled {
            config.enabled = v;
        }
        if let Some(v) = self.account {
            config.account = Some(v);
        }
        if let Some(v) = self.minimum_editcount {
            config.minimum_editcount = Some(v);
        }
        if let Some(v) = self.maximum_editcount {
            config.maximum_editcount = Some(v);
        }
        if let Some(v) = &self.ignore_sections {
            config.ignore_sections = v.clone();
        }
        if let Some(v) = &self.include_sections {
            config.include_sections = v.clone();
        }
        if let Some(v) = self.ignore_lead_section {
            config.ignore_lead_section = v;
        }
        if let Some(v) = self.ignore_disambiguation_pages {
            config.ignore_disambiguation_pages = v;
        }
        if let Some(v) = self.ignore_quoted_content {
            config.ignore_quoted_content = v;
        }
        if let Some(v) = &self.ignore_categories {
            config.ignore_categories = v.clone();
        }
        if let Some(v) = &self.ignore_templates {
            config.ignore_templates = v.clone();
        }
        if let Some(v) = &self.triggers {
            config.triggers = v.clone();
        }
        if let Some(v) = &self.modes {
            config.modes = v.clone();
        }
    }
}
