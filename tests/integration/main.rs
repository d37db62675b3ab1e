//! Integration tests for the audience harvester
//!
//! These tests use wiremock to stand in for the VK API and drive full crawl
//! runs into a temporary SQLite database.

mod crawl_tests;
mod export_tests;
mod support;
