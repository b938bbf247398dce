//! PersonaRegistry: one user's ordered list of persona templates.
//!
//! A plain value type. Services load it from the configuration repository,
//! mutate it inside an atomic update and write it back, so no instance is
//! ever shared between commands.

use agora_types::error::PersonaError;
use agora_types::persona::PersonaTemplate;

use super::defaults::default_personas;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonaRegistry {
    templates: Vec<PersonaTemplate>,
}

impl PersonaRegistry {
    pub fn new(templates: Vec<PersonaTemplate>) -> Self {
        Self { templates }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_personas())
    }

    pub fn into_templates(self) -> Vec<PersonaTemplate> {
        self.templates
    }

    /// All templates in insertion order.
    pub fn list(&self) -> &[PersonaTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Add a template. Names are compared exactly.
    pub fn create(&mut self, template: PersonaTemplate) -> Result<&PersonaTemplate, PersonaError> {
        let name = template.name.trim();
        if name.is_empty() {
            return Err(PersonaError::InvalidName("name cannot be empty".to_string()));
        }
        if name.contains(char::is_whitespace) {
            return Err(PersonaError::InvalidName(format!(
                "'{name}' must not contain whitespace"
            )));
        }
        if self.templates.iter().any(|t| t.name == template.name) {
            return Err(PersonaError::DuplicateName(template.name));
        }
        self.templates.push(template);
        let idx = self.templates.len() - 1;
        Ok(&self.templates[idx])
    }

    /// Remove the template with exactly this name.
    pub fn delete(&mut self, name: &str) -> Result<PersonaTemplate, PersonaError> {
        let idx = self
            .templates
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| PersonaError::NotFound(name.to_string()))?;
        Ok(self.templates.remove(idx))
    }

    /// Remove everything; returns how many templates were dropped.
    pub fn delete_all(&mut self) -> usize {
        let count = self.templates.len();
        self.templates.clear();
        count
    }

    /// Flip `active` on a template looked up case-insensitively.
    /// Returns the new state.
    pub fn toggle(&mut self, name: &str) -> Result<bool, PersonaError> {
        let wanted = name.to_lowercase();
        let template = self
            .templates
            .iter_mut()
            .find(|t| t.name.to_lowercase() == wanted)
            .ok_or_else(|| PersonaError::NotFound(name.to_string()))?;
        template.active = !template.active;
        Ok(template.active)
    }

    /// Case-insensitive lookup.
    pub fn find(&self, name: &str) -> Option<&PersonaTemplate> {
        let wanted = name.to_lowercase();
        self.templates.iter().find(|t| t.name.to_lowercase() == wanted)
    }

    /// Replace the registry with the built-in set. Returns the previous count.
    pub fn load_defaults(&mut self) -> usize {
        std::mem::replace(&mut self.templates, default_personas()).len()
    }

    pub fn active(&self) -> impl Iterator<Item = &PersonaTemplate> {
        self.templates.iter().filter(|t| t.active)
    }

    /// Pick the templates for `count` agents, in registry order.
    pub fn select_active(&self, count: usize) -> Result<Vec<&PersonaTemplate>, PersonaError> {
        let active: Vec<&PersonaTemplate> = self.active().collect();
        if active.is_empty() {
            return Err(PersonaError::NoActiveTemplates);
        }
        if count > active.len() {
            return Err(PersonaError::InsufficientActiveTemplates {
                requested: count,
                active: active.len(),
            });
        }
        Ok((0..count).map(|i| active[i % active.len()]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(name: &str) -> PersonaTemplate {
        PersonaTemplate::new(name, format!("You are {name}."), None)
    }

    #[test]
    fn test_create_rejects_duplicates_case_sensitively() {
        let mut registry = PersonaRegistry::default();
        registry.create(template("poet")).unwrap();

        let err = registry.create(template("poet")).unwrap_err();
        assert!(matches!(err, PersonaError::DuplicateName(name) if name == "poet"));

        registry.create(template("Poet")).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_create_rejects_invalid_names() {
        let mut registry = PersonaRegistry::default();
        assert!(matches!(
            registry.create(template("  ")),
            Err(PersonaError::InvalidName(_))
        ));
        assert!(matches!(
            registry.create(template("two words")),
            Err(PersonaError::InvalidName(_))
        ));
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut registry = PersonaRegistry::default();
        for name in ["c", "a", "b"] {
            registry.create(template(name)).unwrap();
        }
        let names: Vec<&str> = registry.list().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_delete() {
        let mut registry = PersonaRegistry::with_defaults();
        let removed = registry.delete("tech").unwrap();
        assert_eq!(removed.name, "tech");
        assert_eq!(registry.len(), 5);
        assert!(matches!(registry.delete("tech"), Err(PersonaError::NotFound(_))));
    }

    #[test]
    fn test_delete_all() {
        let mut registry = PersonaRegistry::with_defaults();
        assert_eq!(registry.delete_all(), 6);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_toggle_is_an_involution() {
        let mut registry = PersonaRegistry::with_defaults();
        let original = registry.find("politics").unwrap().active;

        let flipped = registry.toggle("POLITICS").unwrap();
        assert_eq!(flipped, !original);
        let restored = registry.toggle("politics").unwrap();
        assert_eq!(restored, original);

        assert!(matches!(registry.toggle("nobody"), Err(PersonaError::NotFound(_))));
    }

    #[test]
    fn test_load_defaults_replaces_templates() {
        let mut registry = PersonaRegistry::default();
        registry.create(template("custom")).unwrap();
        assert_eq!(registry.load_defaults(), 1);
        assert_eq!(registry.len(), 6);
        assert!(registry.find("custom").is_none());
    }

    #[test]
    fn test_select_active_follows_registry_order() {
        let mut registry = PersonaRegistry::with_defaults();
        registry.toggle("sports").unwrap();

        let picked: Vec<&str> = registry
            .select_active(3)
            .unwrap()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(picked, vec!["politics", "finance", "tech"]);
    }

    #[test]
    fn test_select_active_preconditions() {
        let mut registry = PersonaRegistry::new(vec![template("a"), template("b")]);
        for requested in 3..6 {
            assert!(matches!(
                registry.select_active(requested),
                Err(PersonaError::InsufficientActiveTemplates { active: 2, .. })
            ));
        }

        registry.toggle("a").unwrap();
        registry.toggle("b").unwrap();
        assert!(matches!(
            registry.select_active(1),
            Err(PersonaError::NoActiveTemplates)
        ));
    }
}
