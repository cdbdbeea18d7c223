/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

/// An ordered name / value cookie map, later values replace earlier ones
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpCookies {
    inner: Vec<(String, String)>,
}

impl HttpCookies {
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        if let Some(v) = self
            .inner
            .iter_mut()
            .find_map(|(k, v)| if k == name { Some(v) } else { None })
        {
            *v = value.to_string();
        } else {
            self.inner.push((name.to_string(), value.to_string()));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let p = self.inner.iter().position(|(k, _)| k == name)?;
        Some(self.inner.remove(p).1)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn merge(&mut self, other: &HttpCookies) {
        for (k, v) in other.iter() {
            self.insert(k, v);
        }
    }

    /// Add the `name=value` pair of a `Set-Cookie` value, attributes are ignored.
    ///
    /// Returns false if no pair is found.
    pub fn parse_set_cookie(&mut self, value: &str) -> bool {
        let pair = value.split(';').next().unwrap_or_default();
        let Some((name, v)) = pair.split_once('=') else {
            return false;
        };
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.insert(name, v.trim());
        true
    }

    /// Add all `name=value` pairs of a `Cookie` style string like `a=b; c=d`,
    /// items without `=` are skipped
    pub fn parse_cookie_pairs(&mut self, value: &str) -> usize {
        let mut count = 0;
        for item in value.split(';') {
            let Some((name, v)) = item.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            self.insert(name, v.trim());
            count += 1;
        }
        count
    }

    /// The value of a `Cookie` request header, `None` if there is no cookie
    pub fn to_header_value(&self) -> Option<String> {
        if self.inner.is_empty() {
            return None;
        }
        let mut s = String::with_capacity(64);
        for (i, (k, v)) in self.inner.iter().enumerate() {
            if i > 0 {
                s.push_str("; ");
            }
            s.push_str(k);
            s.push('=');
            s.push_str(v);
        }
        Some(s)
    }
}
