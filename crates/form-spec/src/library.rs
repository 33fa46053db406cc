use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::spec::form::FormSchema;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    #[error("form '{0}' already exists")]
    DuplicateForm(String),
    #[error("form '{0}' does not exist")]
    UnknownForm(String),
}

/// Editor application state: every saved form plus the one being edited.
///
/// Forms are held as shared immutable snapshots. Updating a form swaps in a
/// new `Arc`, so anything still holding the previous snapshot keeps a
/// consistent view. Only `forms` is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormLibrary {
    forms: Vec<Arc<FormSchema>>,
    #[serde(skip)]
    current: Option<Arc<FormSchema>>,
}

impl FormLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<FormSchema>> {
        self.forms.iter()
    }

    pub fn get(&self, id: &str) -> Option<Arc<FormSchema>> {
        self.forms.iter().find(|form| form.id == id).cloned()
    }

    pub fn current(&self) -> Option<Arc<FormSchema>> {
        self.current.clone()
    }

    /// Makes `form` the one being edited without saving it.
    pub fn set_current(&mut self, form: FormSchema) -> Arc<FormSchema> {
        let form = Arc::new(form);
        self.current = Some(Arc::clone(&form));
        form
    }

    pub fn add(&mut self, form: FormSchema) -> Result<Arc<FormSchema>, LibraryError> {
        if self.position(&form.id).is_some() {
            return Err(LibraryError::DuplicateForm(form.id));
        }
        let form = Arc::new(form);
        self.forms.push(Arc::clone(&form));
        Ok(form)
    }

    /// Replaces the saved form with the same id, or appends it, and makes it
    /// the current form.
    pub fn upsert(&mut self, form: FormSchema) -> Arc<FormSchema> {
        let form = Arc::new(form);
        match self.position(&form.id) {
            Some(index) => {
                debug!(form = %form.id, "replacing form snapshot");
                self.forms[index] = Arc::clone(&form);
            }
            None => {
                debug!(form = %form.id, "appending form");
                self.forms.push(Arc::clone(&form));
            }
        }
        self.current = Some(Arc::clone(&form));
        form
    }

    /// Removes a saved form; clears the current form if it was that one.
    pub fn remove(&mut self, id: &str) -> Result<Arc<FormSchema>, LibraryError> {
        let index = self
            .position(id)
            .ok_or_else(|| LibraryError::UnknownForm(id.to_string()))?;
        let removed = self.forms.remove(index);
        if self.current.as_ref().is_some_and(|current| current.id == id) {
            self.current = None;
        }
        Ok(removed)
    }

    /// Selects a saved form as the current one.
    pub fn load(&mut self, id: &str) -> Result<Arc<FormSchema>, LibraryError> {
        let form = self
            .get(id)
            .ok_or_else(|| LibraryError::UnknownForm(id.to_string()))?;
        self.current = Some(Arc::clone(&form));
        Ok(form)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.forms.iter().position(|form| form.id == id)
    }
}
