//! Key/value storage
//!
//! LocalStorage on wasm32. Native builds keep values in a thread-local map so
//! the headless demo and tests exercise the same load/save paths.

/// Read a value (None if missing or storage unavailable)
#[cfg(target_arch = "wasm32")]
pub fn get_item(key: &str) -> Option<String> {
    let storage = web_sys::window()?.local_storage().ok()??;
    storage.get_item(key).ok()?
}

/// Write a value. Returns false if storage is unavailable or full.
#[cfg(target_arch = "wasm32")]
pub fn set_item(key: &str, value: &str) -> bool {
    let storage = web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten();

    match storage {
        Some(storage) => storage.set_item(key, value).is_ok(),
        None => {
            log::warn!("LocalStorage unavailable, {} not saved", key);
            false
        }
    }
}

/// Remove a value
#[cfg(target_arch = "wasm32")]
pub fn remove_item(key: &str) {
    if let Some(storage) = web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten()
    {
        let _ = storage.remove_item(key);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::cell::RefCell;
    use std::collections::HashMap;

    thread_local! {
        pub static STORE: RefCell<HashMap<String, String>> = RefCell::new(HashMap::new());
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn get_item(key: &str) -> Option<String> {
    native::STORE.with(|s| s.borrow().get(key).cloned())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn set_item(key: &str, value: &str) -> bool {
    native::STORE.with(|s| s.borrow_mut().insert(key.to_string(), value.to_string()));
    true
}

#[cfg(not(target_arch = "wasm32"))]
pub fn remove_item(key: &str) {
    native::STORE.with(|s| s.borrow_mut().remove(key));
}
