//! X11 integration — foreground window title and XTEST key synthesis.
//!
//! Wraps `x11rb::rust_connection::RustConnection`. The active window is
//! found through the EWMH `_NET_ACTIVE_WINDOW` root property; keys are
//! injected with the XTEST extension using keycodes resolved once from
//! the server's keyboard mapping at connect time.

use std::collections::HashMap;

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{self, Atom, Keycode, Window};
use x11rb::protocol::xtest;
use x11rb::rust_connection::RustConnection;

use super::{ForegroundWindowProvider, InputSynthesizer, Key, PlatformError};

/// Upper bound on title length requested from the server, in 32-bit units.
const TITLE_LONG_LENGTH: u32 = 1024;

/// Pre-interned X11 atoms for property queries.
struct Atoms {
    net_active_window: Atom,
    net_wm_name: Atom,
    utf8_string: Atom,
}

/// X11 connection context for window queries and key synthesis.
pub struct X11Desktop {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
    keycodes: HashMap<Key, Keycode>,
}

fn intern(conn: &RustConnection, name: &[u8]) -> Result<Atom, PlatformError> {
    Ok(xproto::intern_atom(conn, false, name)
        .map_err(|e| PlatformError::Display(format!("intern_atom: {e}")))?
        .reply()
        .map_err(|e| PlatformError::Display(format!("intern_atom reply: {e}")))?
        .atom)
}

/// Map each key to the first keycode whose keysym list contains it.
fn resolve_keycodes(min_keycode: Keycode, keysyms_per_keycode: u8, keysyms: &[u32]) -> HashMap<Key, Keycode> {
    let per = usize::from(keysyms_per_keycode);
    if per == 0 {
        return HashMap::new();
    }

    let mut keycodes = HashMap::new();
    for key in Key::ALL {
        let found = keysyms
            .chunks(per)
            .position(|syms| syms.contains(&key.keysym()))
            .and_then(|offset| u8::try_from(offset).ok())
            .and_then(|offset| min_keycode.checked_add(offset));
        if let Some(code) = found {
            keycodes.insert(key, code);
        }
    }
    keycodes
}

/// Press `codes` in order and release them in reverse.
///
/// If a press fails, the keys already down are still released so no
/// modifier stays stuck; the first error is returned.
fn press_chord(
    codes: &[Keycode],
    mut fake_key: impl FnMut(u8, Keycode) -> Result<(), PlatformError>,
) -> Result<(), PlatformError> {
    let mut outcome = Ok(());
    let mut pressed = 0;
    for &code in codes {
        if let Err(e) = fake_key(xproto::KEY_PRESS_EVENT, code) {
            outcome = Err(e);
            break;
        }
        pressed += 1;
    }
    for &code in codes[..pressed].iter().rev() {
        if let Err(e) = fake_key(xproto::KEY_RELEASE_EVENT, code) {
            tracing::warn!(keycode = code, error = %e, "key release failed");
            if outcome.is_ok() {
                outcome = Err(e);
            }
        }
    }
    outcome
}

impl X11Desktop {
    /// Connect to the X11 display, intern atoms, and resolve keycodes.
    pub fn connect() -> Result<Self, PlatformError> {
        let (conn, screen_num) = RustConnection::connect(None)
            .map_err(|e| PlatformError::Display(format!("connect failed: {e}")))?;

        let root = conn.setup().roots[screen_num].root;

        let atoms = Atoms {
            net_active_window: intern(&conn, b"_NET_ACTIVE_WINDOW")?,
            net_wm_name: intern(&conn, b"_NET_WM_NAME")?,
            utf8_string: intern(&conn, b"UTF8_STRING")?,
        };

        let min_keycode = conn.setup().min_keycode;
        let max_keycode = conn.setup().max_keycode;
        let mapping = xproto::get_keyboard_mapping(&conn, min_keycode, max_keycode - min_keycode + 1)
            .map_err(|e| PlatformError::Display(format!("get_keyboard_mapping: {e}")))?
            .reply()
            .map_err(|e| PlatformError::Display(format!("get_keyboard_mapping reply: {e}")))?;

        let keycodes = resolve_keycodes(min_keycode, mapping.keysyms_per_keycode, &mapping.keysyms);
        for key in Key::ALL {
            if !keycodes.contains_key(&key) {
                tracing::warn!(?key, "no keycode for key in current keyboard mapping");
            }
        }

        Ok(Self {
            conn,
            root,
            atoms,
            keycodes,
        })
    }

    /// Read `_NET_ACTIVE_WINDOW` on root. `None` when no window is active.
    fn active_window(&self) -> Result<Option<Window>, PlatformError> {
        let reply = xproto::get_property(
            &self.conn,
            false,
            self.root,
            self.atoms.net_active_window,
            xproto::AtomEnum::WINDOW,
            0,
            1,
        )
        .map_err(|e| PlatformError::Window(format!("get_property _NET_ACTIVE_WINDOW: {e}")))?
        .reply()
        .map_err(|e| PlatformError::Window(format!("get_property reply: {e}")))?;

        if reply.format != 32 || reply.value.len() < 4 {
            return Ok(None);
        }

        let window_id = u32::from_ne_bytes([
            reply.value[0],
            reply.value[1],
            reply.value[2],
            reply.value[3],
        ]);

        Ok((window_id != 0).then_some(window_id))
    }

    fn string_property(
        &self,
        window: Window,
        property: impl Into<Atom>,
        type_: impl Into<Atom>,
    ) -> Result<String, PlatformError> {
        let reply = xproto::get_property(
            &self.conn,
            false,
            window,
            property,
            type_,
            0,
            TITLE_LONG_LENGTH,
        )
        .map_err(|e| PlatformError::Window(format!("get_property: {e}")))?
        .reply()
        .map_err(|e| PlatformError::Window(format!("get_property reply: {e}")))?;

        if reply.format != 8 {
            return Ok(String::new());
        }
        Ok(String::from_utf8_lossy(&reply.value).into_owned())
    }

    fn keycode(&self, key: Key) -> Result<Keycode, PlatformError> {
        self.keycodes
            .get(&key)
            .copied()
            .ok_or_else(|| PlatformError::Input(format!("no keycode for {key:?}")))
    }

    fn fake_key(&self, event: u8, keycode: Keycode) -> Result<(), PlatformError> {
        xtest::fake_input(
            &self.conn,
            event,
            keycode,
            x11rb::CURRENT_TIME,
            self.root,
            0,
            0,
            0,
        )
        .map_err(|e| PlatformError::Input(format!("fake_input send: {e}")))?
        .check()
        .map_err(|e| PlatformError::Input(format!("fake_input: {e}")))
    }
}

impl ForegroundWindowProvider for X11Desktop {
    /// `_NET_WM_NAME` of the active window, falling back to `WM_NAME`.
    fn title(&self) -> Result<String, PlatformError> {
        let window = self
            .active_window()?
            .ok_or_else(|| PlatformError::Window("no active window".into()))?;

        let title = self.string_property(window, self.atoms.net_wm_name, self.atoms.utf8_string)?;
        if !title.is_empty() {
            return Ok(title);
        }
        self.string_property(window, xproto::AtomEnum::WM_NAME, xproto::AtomEnum::ANY)
    }
}

impl InputSynthesizer for X11Desktop {
    fn send_combo(&self, keys: &[Key]) -> Result<(), PlatformError> {
        let codes = keys
            .iter()
            .map(|&key| self.keycode(key))
            .collect::<Result<Vec<_>, _>>()?;

        press_chord(&codes, |event, code| self.fake_key(event, code))
    }

    fn send_key(&self, key: Key, repeat: u32) -> Result<(), PlatformError> {
        let code = self.keycode(key)?;
        for _ in 0..repeat {
            self.fake_key(xproto::KEY_PRESS_EVENT, code)?;
            self.fake_key(xproto::KEY_RELEASE_EVENT, code)?;
        }
        self.conn
            .flush()
            .map_err(|e| PlatformError::Input(format!("flush: {e}")))
    }
}
