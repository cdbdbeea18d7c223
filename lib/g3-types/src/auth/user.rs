/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use super::AuthParseError;

// Both SOCKS5 username/password auth (rfc1929) and SOCKS4 user id fields use a single length byte.
const CREDENTIAL_MAX_LENGTH: usize = u8::MAX as usize;

fn percent_decode(s: &str) -> Result<String, AuthParseError> {
    percent_encoding::percent_decode_str(s)
        .decode_utf8()
        .map(|v| v.into_owned())
        .map_err(|_| AuthParseError::InvalidPercentEncoding)
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn from_original(s: &str) -> Result<Self, AuthParseError> {
        if s.len() > CREDENTIAL_MAX_LENGTH {
            return Err(AuthParseError::TooLong);
        }
        // the first colon separates username and password in http basic auth
        if s.contains(':') {
            return Err(AuthParseError::InvalidUsername);
        }
        Ok(Username(s.to_string()))
    }

    /// Decode the percent encoded user info part of an url
    pub fn from_encoded(s: &str) -> Result<Self, AuthParseError> {
        let decoded = percent_decode(s)?;
        Username::from_original(&decoded)
    }

    #[inline]
    pub fn as_original(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    #[inline]
    pub fn len(&self) -> u8 {
        self.0.len() as u8
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Username").field(&self.0).finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn from_original(s: &str) -> Result<Self, AuthParseError> {
        if s.len() > CREDENTIAL_MAX_LENGTH {
            return Err(AuthParseError::TooLong);
        }
        Ok(Password(s.to_string()))
    }

    pub fn from_encoded(s: &str) -> Result<Self, AuthParseError> {
        let decoded = percent_decode(s)?;
        Password::from_original(&decoded)
    }

    #[inline]
    pub fn as_original(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    #[inline]
    pub fn len(&self) -> u8 {
        self.0.len() as u8
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(******)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username() {
        let u = Username::from_original("root").unwrap();
        assert_eq!(u.as_original(), "root");
        assert_eq!(u.len(), 4);

        assert_eq!(
            Username::from_original("a:b").unwrap_err(),
            AuthParseError::InvalidUsername
        );

        let long = "x".repeat(256);
        assert_eq!(
            Username::from_original(&long).unwrap_err(),
            AuthParseError::TooLong
        );
    }

    #[test]
    fn encoded() {
        let u = Username::from_encoded("us%40er").unwrap();
        assert_eq!(u.as_original(), "us@er");

        let p = Password::from_encoded("p%3Ass").unwrap();
        assert_eq!(p.as_original(), "p:ss");
        assert_eq!(format!("{p:?}"), "Password(******)");
    }
}
