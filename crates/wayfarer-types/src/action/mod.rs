//! Action and ActionResult — the wire shape every front-end translates into,
//! and the common contract the executor family operates on (spec.md §3, §4.6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitUntil {
    Load,
    DomContentLoaded,
    NetworkIdle0,
    NetworkIdle2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitKind {
    Selector,
    Navigation,
    Timeout,
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotFormat {
    Png,
    Jpeg,
    Webp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfFormat {
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CookieOp {
    Get,
    Set,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipArea {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfMargins {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

/// Tagged union of every action family, kept flat (one enum, not a trait
/// object) so the validator/executor/classifier can `match` exhaustively —
/// mirrors the teacher's preference for data-driven dispatch over dynamic
/// typing at the action layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Action {
    Navigate {
        url: String,
        wait_until: WaitUntil,
        timeout_ms: u64,
    },
    GoBack {
        timeout_ms: u64,
    },
    GoForward {
        timeout_ms: u64,
    },
    Refresh {
        timeout_ms: u64,
    },
    SetViewport {
        width: u32,
        height: u32,
        scale: f64,
    },
    Click {
        selector: String,
        wait_for_selector: bool,
        timeout_ms: u64,
    },
    Type {
        selector: String,
        text: String,
        clear_first: bool,
        timeout_ms: u64,
    },
    Scroll {
        selector: Option<String>,
        x: Option<i64>,
        y: Option<i64>,
        direction: Option<ScrollDirection>,
        smooth: bool,
    },
    Wait {
        kind: WaitKind,
        selector: Option<String>,
        visible: Option<bool>,
        hidden: Option<bool>,
        wait_until: Option<WaitUntil>,
        timeout_ms: u64,
        function_body: Option<String>,
    },
    Evaluate {
        code: String,
        args: Vec<Value>,
        timeout_ms: u64,
        return_by_value: bool,
    },
    EvaluateHandle {
        code: String,
        args: Vec<Value>,
        timeout_ms: u64,
    },
    InjectScript {
        code: String,
        timeout_ms: u64,
    },
    InjectCss {
        code: String,
        timeout_ms: u64,
    },
    Screenshot {
        format: ScreenshotFormat,
        quality: Option<u8>,
        clip: Option<ClipArea>,
        full_page: bool,
        selector: Option<String>,
    },
    Pdf {
        format: PdfFormat,
        landscape: bool,
        scale: f64,
        margins: PdfMargins,
        page_ranges: Option<String>,
        header_template: Option<String>,
        footer_template: Option<String>,
    },
    GetContent,
    GetCookies,
    GetTitle,
    GetUrl,
    Upload {
        selector: String,
        files: Vec<String>,
    },
    Download {
        url: String,
        path: String,
        wait_for_download: bool,
        timeout_ms: u64,
    },
    Cookie {
        op: CookieOp,
        name: Option<String>,
        value: Option<String>,
        domain: Option<String>,
    },
}

impl Action {
    /// Name used in logs, metadata and the error classifier's family match.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::Navigate { .. } => "navigate",
            Action::GoBack { .. } => "goBack",
            Action::GoForward { .. } => "goForward",
            Action::Refresh { .. } => "refresh",
            Action::SetViewport { .. } => "setViewport",
            Action::Click { .. } => "click",
            Action::Type { .. } => "type",
            Action::Scroll { .. } => "scroll",
            Action::Wait { .. } => "wait",
            Action::Evaluate { .. } => "evaluate",
            Action::EvaluateHandle { .. } => "evaluateHandle",
            Action::InjectScript { .. } => "injectScript",
            Action::InjectCss { .. } => "injectCSS",
            Action::Screenshot { .. } => "screenshot",
            Action::Pdf { .. } => "pdf",
            Action::GetContent => "getContent",
            Action::GetCookies => "getCookies",
            Action::GetTitle => "getTitle",
            Action::GetUrl => "getUrl",
            Action::Upload { .. } => "upload",
            Action::Download { .. } => "download",
            Action::Cookie { .. } => "cookie",
        }
    }
}

/// Result of executing one action, returned to the caller regardless of
/// success/failure — errors never cross the transport boundary as
/// exceptions (spec.md §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub action_type: String,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, Value>,
}

impl ActionResult {
    pub fn ok(action_type: &str, start: DateTime<Utc>, data: Value) -> Self {
        Self {
            success: true,
            action_type: action_type.to_string(),
            data: Some(data),
            error: None,
            duration_ms: (Utc::now() - start).num_milliseconds().max(0) as u64,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn err(action_type: &str, start: DateTime<Utc>, error_label: &str) -> Self {
        Self {
            success: false,
            action_type: action_type.to_string(),
            data: None,
            error: Some(error_label.to_string()),
            duration_ms: (Utc::now() - start).num_milliseconds().max(0) as u64,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}
