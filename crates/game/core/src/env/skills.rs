use std::collections::HashMap;

/// Static description of a castable skill.
///
/// Skills that share a `cooldown_group` cannot be cast independently; the
/// host tracks one cooldown timer per group.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillDef {
    pub name: String,
    /// Defaults to the skill's own name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown_group: Option<String>,
    /// Cast range in pixels; `None` for self-cast or untargeted skills.
    #[cfg_attr(feature = "serde", serde(default))]
    pub range: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mp: f64,
}

impl SkillDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cooldown_group: None,
            range: None,
            mp: 0.0,
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.cooldown_group = Some(group.into());
        self
    }

    pub fn with_range(mut self, range: f64) -> Self {
        self.range = Some(range);
        self
    }

    pub fn group(&self) -> &str {
        self.cooldown_group.as_deref().unwrap_or(&self.name)
    }
}

/// Lookup table from skill name to definition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkillTable {
    skills: HashMap<String, SkillDef>,
}

impl SkillTable {
    pub fn new(skills: impl IntoIterator<Item = SkillDef>) -> Self {
        Self {
            skills: skills
                .into_iter()
                .map(|skill| (skill.name.clone(), skill))
                .collect(),
        }
    }

    pub fn insert(&mut self, skill: SkillDef) {
        self.skills.insert(skill.name.clone(), skill);
    }

    pub fn get(&self, name: &str) -> Option<&SkillDef> {
        self.skills.get(name)
    }

    /// Cooldown group of `skill`. Unknown skills form a group of their own.
    pub fn cooldown_group<'a>(&'a self, skill: &'a str) -> &'a str {
        self.skills.get(skill).map_or(skill, SkillDef::group)
    }

    /// All skills sharing `group`.
    pub fn members<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a SkillDef> + 'a {
        self.skills.values().filter(move |skill| skill.group() == group)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
