//! AT-SPI accessibility provider — caret, selection and values over the
//! desktop accessibility bus.
//!
//! Objects are addressed as `(bus name, object path)` pairs and queried
//! with plain method calls on the accessibility bus. The focused control
//! is the first focused descendant of the active top-level window, found
//! through that window's `Collection` interface. Ranges are character
//! offset spans inside one object's `Text` interface.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use zbus::blocking::Connection;
use zbus::blocking::connection::Builder;
use zbus::zvariant::{DynamicType, OwnedObjectPath, OwnedValue, Type, Value};

use super::{AccessibilityProvider, Endpoint, PlatformError};

const REGISTRY: &str = "org.a11y.atspi.Registry";
const ROOT_PATH: &str = "/org/a11y/atspi/accessible/root";
const NULL_PATH: &str = "/org/a11y/atspi/null";

const ACCESSIBLE: &str = "org.a11y.atspi.Accessible";
const COLLECTION: &str = "org.a11y.atspi.Collection";
const TEXT: &str = "org.a11y.atspi.Text";
const VALUE: &str = "org.a11y.atspi.Value";
const PROPERTIES: &str = "org.freedesktop.DBus.Properties";

/// `AtspiStateType` bits.
const STATE_ACTIVE: u32 = 1;
const STATE_FOCUSED: u32 = 12;

const MATCH_ALL: i32 = 1;
const SORT_CANONICAL: u32 = 1;

/// `Collection` match rule: states, attributes, roles, interfaces, each
/// with its match type, then the invert flag.
type MatchRule = (
    Vec<i32>,
    i32,
    HashMap<String, String>,
    i32,
    Vec<i32>,
    i32,
    Vec<String>,
    i32,
    bool,
);

/// An accessible object on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    bus: String,
    path: String,
}

impl ObjectRef {
    /// `None` for the null reference AT-SPI uses in place of a missing
    /// object.
    fn new(bus: impl Into<String>, path: &str) -> Option<Self> {
        let bus = bus.into();
        (!bus.is_empty() && path != NULL_PATH).then(|| Self {
            bus,
            path: path.to_string(),
        })
    }

    fn from_reply((bus, path): (String, OwnedObjectPath)) -> Option<Self> {
        Self::new(bus, path.as_str())
    }

    fn registry_root() -> Self {
        Self {
            bus: REGISTRY.to_string(),
            path: ROOT_PATH.to_string(),
        }
    }
}

/// Character offsets `start..end` inside one object's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    object: ObjectRef,
    start: i32,
    end: i32,
}

impl TextSpan {
    fn new(object: ObjectRef, a: i32, b: i32) -> Self {
        Self {
            object,
            start: a.min(b),
            end: a.max(b),
        }
    }

    fn offset(&self, endpoint: Endpoint) -> i32 {
        match endpoint {
            Endpoint::Start => self.start,
            Endpoint::End => self.end,
        }
    }

    /// Move one endpoint to `offset`, dragging the other along if the
    /// span would otherwise invert.
    fn move_endpoint(&mut self, endpoint: Endpoint, offset: i32) {
        match endpoint {
            Endpoint::Start => {
                self.start = offset;
                self.end = self.end.max(offset);
            }
            Endpoint::End => {
                self.end = offset;
                self.start = self.start.min(offset);
            }
        }
    }
}

/// Whether bit `state` is set in an AT-SPI state set.
fn state_set_contains(words: &[u32], state: u32) -> bool {
    words
        .get((state / 32) as usize)
        .is_some_and(|word| word & (1 << (state % 32)) != 0)
}

/// A two-word state set with `states` set.
fn state_set(states: &[u32]) -> Vec<i32> {
    let mut words = [0u32; 2];
    for &state in states {
        words[(state / 32) as usize % 2] |= 1 << (state % 32);
    }
    words.iter().map(|&w| w as i32).collect()
}

fn int_value(value: &Value<'_>) -> Option<i32> {
    match value {
        Value::I32(n) => Some(*n),
        Value::Value(inner) => int_value(inner),
        _ => None,
    }
}

fn float_value(value: &Value<'_>) -> Option<f64> {
    match value {
        Value::F64(x) => Some(*x),
        Value::Value(inner) => float_value(inner),
        _ => None,
    }
}

fn string_value(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.to_string()),
        Value::Value(inner) => string_value(inner),
        _ => None,
    }
}

fn object_value(value: &Value<'_>) -> Option<(String, String)> {
    match value {
        Value::Structure(fields) => match fields.fields() {
            [Value::Str(bus), Value::ObjectPath(path)] => Some((bus.to_string(), path.to_string())),
            _ => None,
        },
        Value::Value(inner) => object_value(inner),
        _ => None,
    }
}

fn unexpected(what: &str) -> PlatformError {
    PlatformError::Accessibility(format!("{what}: unexpected reply type"))
}

/// Address of the accessibility bus, from the environment or the
/// session bus launcher.
fn bus_address() -> Result<String, PlatformError> {
    if let Ok(address) = std::env::var("AT_SPI_BUS_ADDRESS") {
        if !address.is_empty() {
            return Ok(address);
        }
    }

    let session = Connection::session().map_err(|e| PlatformError::Accessibility(format!("session bus: {e}")))?;
    let reply = session
        .call_method(
            Some("org.a11y.Bus"),
            "/org/a11y/bus",
            Some("org.a11y.Bus"),
            "GetAddress",
            &(),
        )
        .map_err(|e| PlatformError::Accessibility(format!("org.a11y.Bus.GetAddress: {e}")))?;
    reply
        .body()
        .deserialize::<String>()
        .map_err(|e| PlatformError::Accessibility(format!("org.a11y.Bus.GetAddress reply: {e}")))
}

/// Accessibility tree of the running desktop, read over AT-SPI.
pub struct AtSpiAccessibility {
    conn: Connection,
}

impl AtSpiAccessibility {
    /// Connect to the accessibility bus. Blocks.
    pub fn connect() -> Result<Self, PlatformError> {
        let address = bus_address()?;
        let conn = Builder::address(address.as_str())
            .and_then(|builder| builder.build())
            .map_err(|e| PlatformError::Accessibility(format!("connect {address}: {e}")))?;
        tracing::debug!(%address, "accessibility bus connected");
        Ok(Self { conn })
    }

    fn call<B, R>(&self, object: &ObjectRef, interface: &str, method: &str, body: &B) -> Result<R, PlatformError>
    where
        B: Serialize + DynamicType,
        R: DeserializeOwned + Type,
    {
        let reply = self
            .conn
            .call_method(
                Some(object.bus.as_str()),
                object.path.as_str(),
                Some(interface),
                method,
                body,
            )
            .map_err(|e| PlatformError::Accessibility(format!("{interface}.{method}: {e}")))?;
        reply
            .body()
            .deserialize::<R>()
            .map_err(|e| PlatformError::Accessibility(format!("{interface}.{method} reply: {e}")))
    }

    fn property(&self, object: &ObjectRef, interface: &str, name: &str) -> Result<OwnedValue, PlatformError> {
        self.call(object, PROPERTIES, "Get", &(interface, name))
    }

    fn children(&self, object: &ObjectRef) -> Result<Vec<ObjectRef>, PlatformError> {
        let refs: Vec<(String, OwnedObjectPath)> = self.call(object, ACCESSIBLE, "GetChildren", &())?;
        Ok(refs.into_iter().filter_map(ObjectRef::from_reply).collect())
    }

    fn has_state(&self, object: &ObjectRef, state: u32) -> Result<bool, PlatformError> {
        let words: Vec<u32> = self.call(object, ACCESSIBLE, "GetState", &())?;
        Ok(state_set_contains(&words, state))
    }

    fn implements(&self, object: &ObjectRef, interface: &str) -> bool {
        match self.call::<_, Vec<String>>(object, ACCESSIBLE, "GetInterfaces", &()) {
            Ok(interfaces) => interfaces.iter().any(|i| i == interface),
            Err(e) => {
                tracing::debug!(path = %object.path, error = %e, "interface query failed");
                false
            }
        }
    }

    /// Top-level windows in the active state, across all applications.
    fn active_windows(&self) -> Result<Vec<ObjectRef>, PlatformError> {
        let mut active = Vec::new();
        for app in self.children(&ObjectRef::registry_root())? {
            let windows = match self.children(&app) {
                Ok(windows) => windows,
                Err(e) => {
                    tracing::debug!(app = %app.bus, error = %e, "skipping unresponsive application");
                    continue;
                }
            };
            for window in windows {
                if self.has_state(&window, STATE_ACTIVE).unwrap_or(false) {
                    active.push(window);
                }
            }
        }
        Ok(active)
    }

    fn first_focused(&self, window: &ObjectRef) -> Result<Option<ObjectRef>, PlatformError> {
        let rule: MatchRule = (
            state_set(&[STATE_FOCUSED]),
            MATCH_ALL,
            HashMap::new(),
            MATCH_ALL,
            Vec::new(),
            MATCH_ALL,
            Vec::new(),
            MATCH_ALL,
            false,
        );
        let matches: Vec<(String, OwnedObjectPath)> =
            self.call(window, COLLECTION, "GetMatches", &(rule, SORT_CANONICAL, 1i32, true))?;
        Ok(matches.into_iter().find_map(ObjectRef::from_reply))
    }
}

impl AccessibilityProvider for AtSpiAccessibility {
    type Control = ObjectRef;
    type TextPattern = ObjectRef;
    type ValuePattern = ObjectRef;
    type Range = TextSpan;

    // The bus connection is shared by all threads.
    fn enter_thread(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn leave_thread(&self) {}

    fn focused_control(&self) -> Result<Option<ObjectRef>, PlatformError> {
        for window in self.active_windows()? {
            match self.first_focused(&window) {
                Ok(Some(control)) => return Ok(Some(control)),
                Ok(None) => {}
                Err(e) => tracing::debug!(path = %window.path, error = %e, "focus search failed"),
            }
        }
        Ok(None)
    }

    fn parent(&self, control: &ObjectRef) -> Result<Option<ObjectRef>, PlatformError> {
        let value = self.property(control, ACCESSIBLE, "Parent")?;
        let (bus, path) = object_value(&value).ok_or_else(|| unexpected("Parent"))?;
        Ok(ObjectRef::new(bus, &path))
    }

    fn name(&self, control: &ObjectRef) -> Result<String, PlatformError> {
        let value = self.property(control, ACCESSIBLE, "Name")?;
        string_value(&value).ok_or_else(|| unexpected("Name"))
    }

    fn class_name(&self, control: &ObjectRef) -> Result<String, PlatformError> {
        self.call(control, ACCESSIBLE, "GetRoleName", &())
    }

    fn text_capability(&self, control: &ObjectRef) -> Option<ObjectRef> {
        self.implements(control, TEXT).then(|| control.clone())
    }

    fn value_capability(&self, control: &ObjectRef) -> Option<ObjectRef> {
        self.implements(control, VALUE).then(|| control.clone())
    }

    fn value(&self, pattern: &ObjectRef) -> Result<String, PlatformError> {
        let value = self.property(pattern, VALUE, "CurrentValue")?;
        float_value(&value)
            .map(|x| x.to_string())
            .ok_or_else(|| unexpected("CurrentValue"))
    }

    fn selection(&self, pattern: &ObjectRef) -> Result<Vec<TextSpan>, PlatformError> {
        let count: i32 = self.call(pattern, TEXT, "GetNSelections", &())?;
        if count > 0 {
            return (0..count)
                .map(|n| -> Result<TextSpan, PlatformError> {
                    let (start, end): (i32, i32) = self.call(pattern, TEXT, "GetSelection", &n)?;
                    Ok(TextSpan::new(pattern.clone(), start, end))
                })
                .collect();
        }

        let value = self.property(pattern, TEXT, "CaretOffset")?;
        let caret = int_value(&value).ok_or_else(|| unexpected("CaretOffset"))?;
        if caret < 0 {
            return Ok(Vec::new());
        }
        Ok(vec![TextSpan::new(pattern.clone(), caret, caret)])
    }

    fn document_range(&self, pattern: &ObjectRef) -> Result<TextSpan, PlatformError> {
        let value = self.property(pattern, TEXT, "CharacterCount")?;
        let count = int_value(&value).ok_or_else(|| unexpected("CharacterCount"))?;
        Ok(TextSpan::new(pattern.clone(), 0, count.max(0)))
    }

    fn clone_range(&self, range: &TextSpan) -> Result<TextSpan, PlatformError> {
        Ok(range.clone())
    }

    fn move_endpoint_to(
        &self,
        range: &mut TextSpan,
        endpoint: Endpoint,
        target: &TextSpan,
        target_endpoint: Endpoint,
    ) -> Result<(), PlatformError> {
        range.move_endpoint(endpoint, target.offset(target_endpoint));
        Ok(())
    }

    fn text(&self, range: &TextSpan, max_len: Option<usize>) -> Result<String, PlatformError> {
        if range.start == range.end {
            return Ok(String::new());
        }
        let text: String = self.call(&range.object, TEXT, "GetText", &(range.start, range.end))?;
        Ok(match max_len {
            Some(max) => text.chars().take(max).collect(),
            None => text,
        })
    }
}
