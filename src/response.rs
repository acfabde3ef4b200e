//! Records reported back to a client after authentication and execution.
//!
//! These are plain data. Optional fields are `Option`, equality is
//! field-wise, and every record can be reset to its default with `clear()`.

use crate::datatypes::DataSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Status codes of the client protocol
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorCode {
    #[default]
    Succeeded = 0,
    Disconnected = -1,
    FailToConnect = -2,
    RpcFailure = -3,
    BadUsernamePassword = -1001,
    SessionInvalid = -1002,
    SessionTimeout = -1003,
    SyntaxError = -1004,
    ExecutionError = -1005,
    /// Nothing was executed, e.g. the statement was only a comment
    StatementEmpty = -1006,
    UserNotFound = -18,
    BadPermission = -1008,
    SemanticError = -1009,
    TooManyConnections = -1010,
    PartialSucceeded = -1011,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        let error = match code {
            0 => ErrorCode::Succeeded,
            -1 => ErrorCode::Disconnected,
            -2 => ErrorCode::FailToConnect,
            -3 => ErrorCode::RpcFailure,
            -1001 => ErrorCode::BadUsernamePassword,
            -1002 => ErrorCode::SessionInvalid,
            -1003 => ErrorCode::SessionTimeout,
            -1004 => ErrorCode::SyntaxError,
            -1005 => ErrorCode::ExecutionError,
            -1006 => ErrorCode::StatementEmpty,
            -18 => ErrorCode::UserNotFound,
            -1008 => ErrorCode::BadPermission,
            -1009 => ErrorCode::SemanticError,
            -1010 => ErrorCode::TooManyConnections,
            -1011 => ErrorCode::PartialSucceeded,
            _ => return None,
        };
        Some(error)
    }

    pub fn is_succeeded(self) -> bool {
        self == ErrorCode::Succeeded
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    pub error_code: ErrorCode,
    pub session_id: Option<i64>,
    pub error_msg: Option<String>,
}

impl AuthResponse {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Profiling data of one executor run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfilingStats {
    /// Rows processed by the executor
    pub rows: i64,
    /// Time spent in the executor itself
    pub exec_duration_in_us: i64,
    /// Time including scheduling
    pub total_duration_in_us: i64,
    pub other_stats: Option<HashMap<String, String>>,
}

impl ProfilingStats {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Which branch of a select/loop node a plan node belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanNodeBranchInfo {
    /// Loop body or `then` branch of a select
    pub is_do_branch: bool,
    pub condition_node_id: i64,
}

impl Default for PlanNodeBranchInfo {
    fn default() -> Self {
        Self {
            is_do_branch: false,
            condition_node_id: -1,
        }
    }
}

impl PlanNodeBranchInfo {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pair {
    pub key: String,
    pub value: String,
}

impl Pair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn clear(&mut self) {
        self.key.clear();
        self.value.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanNodeDescription {
    pub name: String,
    pub id: i64,
    pub output_var: String,
    pub description: Option<Vec<Pair>>,
    /// One entry per run when the node is executed more than once
    pub profiles: Option<Vec<ProfilingStats>>,
    pub branch_info: Option<PlanNodeBranchInfo>,
    pub dependencies: Option<Vec<i64>>,
}

impl Default for PlanNodeDescription {
    fn default() -> Self {
        Self {
            name: String::new(),
            id: -1,
            output_var: String::new(),
            description: None,
            profiles: None,
            branch_info: None,
            dependencies: None,
        }
    }
}

impl PlanNodeDescription {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanDescription {
    pub plan_node_descs: Vec<PlanNodeDescription>,
    /// Node id to its index in `plan_node_descs`
    pub node_index_map: HashMap<i64, i64>,
    /// Print format of the plan, a lower-case name such as `dot`
    pub format: String,
    pub optimize_time_in_us: i32,
}

impl PlanDescription {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Append a node and index it by id
    pub fn push_node(&mut self, node: PlanNodeDescription) {
        self.node_index_map
            .insert(node.id, self.plan_node_descs.len() as i64);
        self.plan_node_descs.push(node);
    }

    pub fn node(&self, id: i64) -> Option<&PlanNodeDescription> {
        let index = *self.node_index_map.get(&id)?;
        self.plan_node_descs.get(usize::try_from(index).ok()?)
    }
}

// optimize_time_in_us is informational and does not take part in equality
impl PartialEq for PlanDescription {
    fn eq(&self, other: &Self) -> bool {
        self.plan_node_descs == other.plan_node_descs
            && self.node_index_map == other.node_index_map
            && self.format == other.format
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub error_code: ErrorCode,
    pub latency_in_us: i32,
    pub data: Option<DataSet>,
    pub space_name: Option<String>,
    pub error_msg: Option<String>,
    pub plan_desc: Option<PlanDescription>,
    pub comment: Option<String>,
}

impl ExecutionResponse {
    pub fn succeeded(data: DataSet) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn error(error_code: ErrorCode, error_msg: impl Into<String>) -> Self {
        Self {
            error_code,
            error_msg: Some(error_msg.into()),
            ..Self::default()
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Serialize the response to bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize a response from bytes.
    pub fn deserialize(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}
