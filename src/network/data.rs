use std::collections::BTreeSet;

/// Whether a transition executes an application step of the route or only routes control flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    App,
    #[default]
    Control,
}

/// Data-flow effect of a transition: which tags it requires, reads, writes and erases.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextObject {
    pub required_context: BTreeSet<String>,
    pub read: Option<String>,
    pub write: Option<String>,
    pub erase: Option<String>,
    pub kind: TransitionKind,
}

impl ContextObject {
    pub fn new(kind: TransitionKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn app() -> Self {
        Self::new(TransitionKind::App)
    }

    pub fn control() -> Self {
        Self::new(TransitionKind::Control)
    }

    pub fn required_context<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_context = tags.into_iter().map(Into::into).collect();

        self
    }

    pub fn read(mut self, tag: impl Into<String>) -> Self {
        self.read = Some(tag.into());

        self
    }

    pub fn write(mut self, tag: impl Into<String>) -> Self {
        self.write = Some(tag.into());

        self
    }

    pub fn erase(mut self, tag: impl Into<String>) -> Self {
        self.erase = Some(tag.into());

        self
    }

    pub fn reads(&self, tag: &str) -> bool {
        self.read.as_deref() == Some(tag)
    }

    pub fn writes(&self, tag: &str) -> bool {
        self.write.as_deref() == Some(tag)
    }

    pub fn erases(&self, tag: &str) -> bool {
        self.erase.as_deref() == Some(tag)
    }

    pub fn requires(&self, tag: &str) -> bool {
        self.required_context.contains(tag)
    }

    /// Short human-readable summary, used as a label when rendering.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(read) = &self.read {
            parts.push(format!("r:{}", read));
        }
        if let Some(write) = &self.write {
            parts.push(format!("w:{}", write));
        }
        if let Some(erase) = &self.erase {
            parts.push(format!("e:{}", erase));
        }
        if !self.required_context.is_empty() {
            let tags = self.required_context.iter().cloned().collect::<Vec<_>>();
            parts.push(format!("ctx:{}", tags.join("+")));
        }
        parts.join(" ")
    }
}
