//! Shared types used across the runner: the `ReportFormat` output tags and the
//! `ParamValue` kinds produced by the parameter decoder.
use chrono::NaiveDate;
use clap::ValueEnum;

use crate::error::{Error, Result};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug)]
pub enum ReportFormat {
    Pdf,
    Html,
    Xls,
    Doc,
}

impl ReportFormat {
    /// Fallback used when neither the job nor the batch names a format.
    pub const FALLBACK: ReportFormat = ReportFormat::Pdf;

    /// Case-insensitive lookup of a format tag such as `pdf` or `HTML`.
    pub fn parse(tag: &str) -> Result<Self> {
        <ReportFormat as ValueEnum>::from_str(tag.trim(), true).map_err(|_| {
            Error::UnsupportedFormat {
                format: tag.to_string(),
            }
        })
    }

    /// Engine-facing format tag.
    pub fn tag(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Html => "html",
            ReportFormat::Xls => "xls",
            ReportFormat::Doc => "doc",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReportFormat::Pdf => "PDF",
            ReportFormat::Html => "HTML",
            ReportFormat::Xls => "XLS",
            ReportFormat::Doc => "DOC",
        };
        write!(f, "{}", s)
    }
}

/// A report parameter value after type inference.
#[derive(Clone, PartialEq, Debug)]
pub enum ParamValue {
    Bool(bool),
    Int(i32),
    Float(f64),
    Date(NaiveDate),
    Str(String),
    /// Multi-select values, in the order they were written.
    List(Vec<ParamValue>),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            ParamValue::Str(s) => write!(f, "{}", s),
            ParamValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}
