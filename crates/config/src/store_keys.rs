// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub struct StoreKeys;

impl StoreKeys {
    pub fn session_index() -> String {
        String::from("//umbra/_index")
    }

    pub fn session_root(session: &str) -> String {
        format!("//umbra/{session}")
    }

    pub fn context(session: &str) -> String {
        format!("//umbra/{session}/context")
    }

    pub fn joint_public_key(session: &str) -> String {
        format!("//umbra/{session}/joint_public_key")
    }

    pub fn session(session: &str) -> String {
        format!("//umbra/{session}/session")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_live_under_the_session_root() {
        let root = StoreKeys::session_root("brave-quiet-fox");
        assert_eq!(root, "//umbra/brave-quiet-fox");
        for key in [
            StoreKeys::context("brave-quiet-fox"),
            StoreKeys::joint_public_key("brave-quiet-fox"),
            StoreKeys::session("brave-quiet-fox"),
        ] {
            assert!(key.starts_with(&format!("{root}/")));
        }
    }
}
