//! Test-Suites fuer Verzeichnis und Session

mod session_tests;
