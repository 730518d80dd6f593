//! Training simulator prompt and console log
//!
//! Nothing is trained here. The pipeline structure is serialized into an
//! instruction text for an external text generator, and the generator's
//! answer is appended to the console log shown under the canvas.

use serde::Serialize;

use crate::error::{FlowError, Result};
use crate::types::{FlowEdge, FlowGraph, FlowNode};

/// Default text-generation model
pub const TEXT_MODEL: &str = "gemini-3-flash-preview";

/// Console text shown before the first run
pub const CONSOLE_PLACEHOLDER: &str = "Ready to run...";

/// Message for a run requested on an empty canvas
pub const EMPTY_PIPELINE_MESSAGE: &str = "노드를 추가해주세요.";

/// Substituted when the generator answers without text
pub const NO_RESULT_TEXT: &str = "시뮬레이션 결과를 생성할 수 없습니다.";

/// Substituted when the generator call itself fails
pub const GENERATOR_ERROR_TEXT: &str = "시스템 오류: 시뮬레이션을 실행할 수 없습니다.";

const PREAMBLE: &str = "클라우드 연결 중...\n노드 구조 분석 중...\n";
const FAILURE_LINE: &str = "오류 발생.";

#[derive(Serialize)]
struct PipelineDocument<'a> {
    nodes: &'a [FlowNode],
    edges: &'a [FlowEdge],
}

/// Instruction text sent to the text generator
pub struct SimulationPrompt;

impl SimulationPrompt {
    /// Build the prompt for a graph
    ///
    /// Fails with [`FlowError::EmptyPipeline`] when the graph has no nodes.
    pub fn build(graph: &FlowGraph) -> Result<String> {
        if graph.nodes.is_empty() {
            return Err(FlowError::EmptyPipeline);
        }
        let structure = serde_json::to_string_pretty(&PipelineDocument {
            nodes: &graph.nodes,
            edges: &graph.edges,
        })?;

        Ok(format!(
            "\n      The student has designed a Machine Learning pipeline using a node-based visual editor.\n      \
             Here is the structure of their flow (Nodes and Edges):\n      \
             {structure}\n\n      \
             Please act as a \"Training Simulator Console\". \n      \
             1. Analyze the logic of their flow. Does it make sense? (e.g., Dataset -> Preprocess -> Model -> Train -> Eval).\n      \
             2. If the logic is sound, simulate a training log output. Show epochs, loss decreasing, and final accuracy.\n      \
             3. If the logic is broken (e.g., Model connected directly to Eval without Training), explain the error like a compiler error message.\n      \
             4. Keep the tone educational but technical enough for a university lab simulation.\n      \
             5. Output format should look like a terminal log.\n      \
             6. Language: Korean.\n    "
        ))
    }

    /// Normalize a generator answer; blank answers become [`NO_RESULT_TEXT`]
    pub fn answer_text(answer: Option<String>) -> String {
        match answer {
            Some(text) if !text.trim().is_empty() => text,
            _ => NO_RESULT_TEXT.to_string(),
        }
    }
}

/// Console log text accumulated across simulation runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationLog {
    text: String,
}

impl SimulationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a log from saved project content
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Start a run, replacing any earlier text with the preamble
    pub fn begin(&mut self) {
        self.text = PREAMBLE.to_string();
    }

    pub fn append_result(&mut self, result: &str) {
        self.text.push('\n');
        self.text.push_str(result);
    }

    pub fn append_failure(&mut self) {
        self.text.push('\n');
        self.text.push_str(FAILURE_LINE);
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// What the console shows; the placeholder while empty
    pub fn display(&self) -> &str {
        if self.text.is_empty() {
            CONSOLE_PLACEHOLDER
        } else {
            &self.text
        }
    }
}
