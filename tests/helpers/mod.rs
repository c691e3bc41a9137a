// ABOUTME: Test helper modules for integration tests
// ABOUTME: HTTP request utilities shared by the route test suites
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
#![allow(dead_code)]

pub mod axum_test;
