/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SocksAuthMethod {
    None,
    GssApi,
    User,
    OtherAssigned(u8),
    Private(u8),
    NoAcceptable,
}

impl SocksAuthMethod {
    pub(crate) const fn code(&self) -> u8 {
        match self {
            SocksAuthMethod::None => 0x00,
            SocksAuthMethod::GssApi => 0x01,
            SocksAuthMethod::User => 0x02,
            SocksAuthMethod::OtherAssigned(v) => *v,
            SocksAuthMethod::Private(v) => *v,
            SocksAuthMethod::NoAcceptable => 0xFF,
        }
    }
}

impl fmt::Display for SocksAuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksAuthMethod::None => write!(f, "None"),
            SocksAuthMethod::GssApi => write!(f, "GssApi"),
            SocksAuthMethod::User => write!(f, "User"),
            SocksAuthMethod::OtherAssigned(v) => write!(f, "OtherAssigned({v})"),
            SocksAuthMethod::Private(v) => write!(f, "Private({v})"),
            SocksAuthMethod::NoAcceptable => write!(f, "NoAcceptable"),
        }
    }
}

impl From<u8> for SocksAuthMethod {
    fn from(method: u8) -> Self {
        match method {
            0x00 => Self::None,
            0x01 => Self::GssApi,
            0x02 => Self::User,
            v if method <= 0x7F => Self::OtherAssigned(v),
            v if method < 0xFF => Self::Private(v),
            _ => Self::NoAcceptable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_code() {
        assert_eq!(SocksAuthMethod::from(0x02), SocksAuthMethod::User);
        assert_eq!(SocksAuthMethod::from(0xFF), SocksAuthMethod::NoAcceptable);
        assert_eq!(SocksAuthMethod::from(0x80), SocksAuthMethod::Private(0x80));
        assert_eq!(SocksAuthMethod::User.code(), 0x02);
        assert_eq!(SocksAuthMethod::None.to_string(), "None");
    }
}
