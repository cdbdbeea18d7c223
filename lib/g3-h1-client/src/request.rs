/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use http::Method;

use crate::HttpContent;

pub struct HttpClientRequest {
    pub method: Method,
    /// absolute url, or a path relative to the base url of the client
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Arc<dyn HttpContent>>,
}

impl HttpClientRequest {
    pub fn new(method: Method, url: &str) -> Self {
        HttpClientRequest {
            method,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: &str) -> Self {
        HttpClientRequest::new(Method::GET, url)
    }

    pub fn post<C: HttpContent + 'static>(url: &str, body: C) -> Self {
        let mut req = HttpClientRequest::new(Method::POST, url);
        req.set_body(body);
        req
    }

    pub fn append_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn set_body<C: HttpContent + 'static>(&mut self, body: C) {
        self.body = Some(Arc::new(body));
    }
}
