// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

/// Anything that can name a storage slot.
pub trait IntoKey {
    fn into_key(self) -> Vec<u8>;
}

impl IntoKey for Vec<u8> {
    fn into_key(self) -> Vec<u8> {
        self
    }
}

impl IntoKey for &Vec<u8> {
    fn into_key(self) -> Vec<u8> {
        self.clone()
    }
}

impl IntoKey for &[u8] {
    fn into_key(self) -> Vec<u8> {
        self.to_vec()
    }
}

impl IntoKey for String {
    fn into_key(self) -> Vec<u8> {
        self.into_bytes()
    }
}

impl IntoKey for &String {
    fn into_key(self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl IntoKey for &str {
    fn into_key(self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

/// Path segments are joined with `/`.
impl IntoKey for Vec<&str> {
    fn into_key(self) -> Vec<u8> {
        self.join("/").into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_join_with_slash() {
        assert_eq!(vec!["umbra", "abc", "session"].into_key(), b"umbra/abc/session");
        assert_eq!("x".into_key(), b"x".to_vec());
        assert_eq!((&b"raw"[..]).into_key(), b"raw".to_vec());
    }
}
