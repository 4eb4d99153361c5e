#![allow(missing_docs)]

pub(crate) mod db;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use db::{must_create_test_connection, must_create_test_state};
pub(crate) use html::{assert_valid_html, parse_html_document};
pub(crate) use http::{assert_content_type, assert_status_ok, response_json};
