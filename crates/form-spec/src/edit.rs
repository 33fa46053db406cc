//! Copy-on-write edits. Every operation returns a new snapshot and leaves
//! the receiver untouched, so evaluations holding the old one stay consistent.

use thiserror::Error;

use crate::spec::element::Element;
use crate::spec::form::FormSchema;
use crate::spec::step::Step;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("step '{0}' does not exist")]
    UnknownStep(String),
    #[error("element '{element_id}' does not exist in step '{step_id}'")]
    UnknownElement { step_id: String, element_id: String },
    #[error("step '{step_id}' has no element at position {index}")]
    IndexOutOfRange { step_id: String, index: usize },
    #[error("the last step of a form cannot be removed")]
    LastStep,
}

impl FormSchema {
    /// New untitled form with a single one-column step `step-1`.
    pub fn blank(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            description: Some(String::new()),
            steps: vec![Step {
                description: Some(String::new()),
                ..Step::new("step-1", "Step 1")
            }],
        }
    }

    pub fn with_step_added(&self, step: Step) -> Self {
        let mut next = self.clone();
        next.steps.push(step);
        next
    }

    pub fn with_step_removed(&self, step_id: &str) -> Result<Self, EditError> {
        let index = self.step_position(step_id)?;
        if self.steps.len() <= 1 {
            return Err(EditError::LastStep);
        }
        let mut next = self.clone();
        next.steps.remove(index);
        Ok(next)
    }

    /// Replaces the step carrying `step.id`.
    pub fn with_step_replaced(&self, step: Step) -> Result<Self, EditError> {
        let index = self.step_position(&step.id)?;
        let mut next = self.clone();
        next.steps[index] = step;
        Ok(next)
    }

    pub fn with_element_added(&self, step_id: &str, element: Element) -> Result<Self, EditError> {
        self.edit_step(step_id, |step| {
            step.elements.push(element);
            Ok(())
        })
    }

    /// Moves the element at `from` so that it ends up at `to`.
    pub fn with_element_moved(
        &self,
        step_id: &str,
        from: usize,
        to: usize,
    ) -> Result<Self, EditError> {
        self.edit_step(step_id, |step| {
            let len = step.elements.len();
            if let Some(index) = [from, to].into_iter().find(|index| *index >= len) {
                return Err(EditError::IndexOutOfRange {
                    step_id: step.id.clone(),
                    index,
                });
            }
            let element = step.elements.remove(from);
            step.elements.insert(to, element);
            Ok(())
        })
    }

    /// Replaces the element with the same id as `element`.
    pub fn with_element_replaced(
        &self,
        step_id: &str,
        element: Element,
    ) -> Result<Self, EditError> {
        self.edit_step(step_id, |step| {
            let slot = step
                .elements
                .iter_mut()
                .find(|existing| existing.id() == element.id())
                .ok_or_else(|| EditError::UnknownElement {
                    step_id: step.id.clone(),
                    element_id: element.id().to_string(),
                })?;
            *slot = element;
            Ok(())
        })
    }

    pub fn with_element_removed(&self, step_id: &str, element_id: &str) -> Result<Self, EditError> {
        self.edit_step(step_id, |step| {
            let index = step
                .elements
                .iter()
                .position(|element| element.id() == element_id)
                .ok_or_else(|| EditError::UnknownElement {
                    step_id: step.id.clone(),
                    element_id: element_id.to_string(),
                })?;
            step.elements.remove(index);
            Ok(())
        })
    }

    fn step_position(&self, step_id: &str) -> Result<usize, EditError> {
        self.steps
            .iter()
            .position(|step| step.id == step_id)
            .ok_or_else(|| EditError::UnknownStep(step_id.to_string()))
    }

    fn edit_step<F>(&self, step_id: &str, edit: F) -> Result<Self, EditError>
    where
        F: FnOnce(&mut Step) -> Result<(), EditError>,
    {
        let index = self.step_position(step_id)?;
        let mut next = self.clone();
        edit(&mut next.steps[index])?;
        Ok(next)
    }
}
