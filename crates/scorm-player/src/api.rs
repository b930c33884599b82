//! Method names and data-element keys of the two runtime API generations
//! (SCORM 1.2 `API` and SCORM 2004 `API_1484_11`).

/// One of the eight runtime API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    Initialize,
    Finish,
    GetValue,
    SetValue,
    Commit,
    GetLastError,
    GetErrorString,
    GetDiagnostic,
}

impl ApiMethod {
    pub const ALL: [ApiMethod; 8] = [
        ApiMethod::Initialize,
        ApiMethod::Finish,
        ApiMethod::GetValue,
        ApiMethod::SetValue,
        ApiMethod::Commit,
        ApiMethod::GetLastError,
        ApiMethod::GetErrorString,
        ApiMethod::GetDiagnostic,
    ];

    /// The SCORM 1.2 and SCORM 2004 names of this operation.
    pub fn names(&self) -> [&'static str; 2] {
        match self {
            ApiMethod::Initialize => ["LMSInitialize", "Initialize"],
            ApiMethod::Finish => ["LMSFinish", "Terminate"],
            ApiMethod::GetValue => ["LMSGetValue", "GetValue"],
            ApiMethod::SetValue => ["LMSSetValue", "SetValue"],
            ApiMethod::Commit => ["LMSCommit", "Commit"],
            ApiMethod::GetLastError => ["LMSGetLastError", "GetLastError"],
            ApiMethod::GetErrorString => ["LMSGetErrorString", "GetErrorString"],
            ApiMethod::GetDiagnostic => ["LMSGetDiagnostic", "GetDiagnostic"],
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.names().contains(&name))
    }
}

/// Data elements the shim answers itself instead of reading raw storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Status,
    ScoreRaw,
    ScoreMin,
    ScoreMax,
    SessionTime,
    TotalTime,
    LearnerId,
    LearnerName,
}

impl Element {
    const ALL: [Element; 8] = [
        Element::Status,
        Element::ScoreRaw,
        Element::ScoreMin,
        Element::ScoreMax,
        Element::SessionTime,
        Element::TotalTime,
        Element::LearnerId,
        Element::LearnerName,
    ];

    /// The SCORM 1.2 and SCORM 2004 keys of this element.
    pub fn keys(&self) -> [&'static str; 2] {
        match self {
            Element::Status => ["cmi.core.lesson_status", "cmi.completion_status"],
            Element::ScoreRaw => ["cmi.core.score.raw", "cmi.score.raw"],
            Element::ScoreMin => ["cmi.core.score.min", "cmi.score.min"],
            Element::ScoreMax => ["cmi.core.score.max", "cmi.score.max"],
            Element::SessionTime => ["cmi.core.session_time", "cmi.session_time"],
            Element::TotalTime => ["cmi.core.total_time", "cmi.total_time"],
            Element::LearnerId => ["cmi.core.student_id", "cmi.learner_id"],
            Element::LearnerName => ["cmi.core.student_name", "cmi.learner_name"],
        }
    }

    pub fn classify(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|element| element.keys().contains(&key))
    }
}
