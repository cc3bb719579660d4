use bf_solver::IterationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Configuring,
    Relaxing,
    Exporting,
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub reynolds: f64,
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub iteration: Option<IterationReport>,
}

impl RunProgressEvent {
    pub fn stage(reynolds: f64, stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            reynolds,
            stage,
            elapsed_wall_s,
            message,
            iteration: None,
        }
    }
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::Configuring => "configuring",
            RunStage::Relaxing => "relaxing",
            RunStage::Exporting => "exporting",
            RunStage::Completed => "completed",
            RunStage::Failed => "failed",
        }
    }
}
