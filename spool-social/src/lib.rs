//! Social profile scraping for Spool.
//!
//! Only Threads is implemented. The [`threads`] module holds the page fetcher
//! and the extraction pipeline that turns a raw profile page into
//! time-ordered [`threads::PostRecord`]s.
pub mod threads;
