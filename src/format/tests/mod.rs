//! Unit tests for the label file format.
//!
//! These tests cover decoding of every label variant, the legacy file
//! shapes, and lossless round trips of nested label trees.

mod label_file_tests;
