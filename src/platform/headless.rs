//! Accessibility provider for desktops without an accessibility bus.
//!
//! Without AT-SPI there is no caret or text-range information, so this
//! adapter reports no focused control and the engine falls through to
//! the clipboard tiers.

use std::convert::Infallible;

use super::{AccessibilityProvider, Endpoint, PlatformError};

/// An accessibility tree with nothing in it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAccessibility;

impl AccessibilityProvider for NoAccessibility {
    type Control = Infallible;
    type TextPattern = Infallible;
    type ValuePattern = Infallible;
    type Range = Infallible;

    fn enter_thread(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn leave_thread(&self) {}

    fn focused_control(&self) -> Result<Option<Infallible>, PlatformError> {
        Ok(None)
    }

    fn parent(&self, control: &Infallible) -> Result<Option<Infallible>, PlatformError> {
        match *control {}
    }

    fn name(&self, control: &Infallible) -> Result<String, PlatformError> {
        match *control {}
    }

    fn class_name(&self, control: &Infallible) -> Result<String, PlatformError> {
        match *control {}
    }

    fn text_capability(&self, control: &Infallible) -> Option<Infallible> {
        match *control {}
    }

    fn value_capability(&self, control: &Infallible) -> Option<Infallible> {
        match *control {}
    }

    fn value(&self, pattern: &Infallible) -> Result<String, PlatformError> {
        match *pattern {}
    }

    fn selection(&self, pattern: &Infallible) -> Result<Vec<Infallible>, PlatformError> {
        match *pattern {}
    }

    fn document_range(&self, pattern: &Infallible) -> Result<Infallible, PlatformError> {
        match *pattern {}
    }

    fn clone_range(&self, range: &Infallible) -> Result<Infallible, PlatformError> {
        match *range {}
    }

    fn move_endpoint_to(
        &self,
        range: &mut Infallible,
        _endpoint: Endpoint,
        _target: &Infallible,
        _target_endpoint: Endpoint,
    ) -> Result<(), PlatformError> {
        match *range {}
    }

    fn text(&self, range: &Infallible, _max_len: Option<usize>) -> Result<String, PlatformError> {
        match *range {}
    }
}
