#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingCase,
    CheckingCache,
    LoadingCachedResult,
    BuildingRateTable,
    Simulating,
    SavingResults,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::LoadingCase => "loading case",
            RunStage::CheckingCache => "checking cache",
            RunStage::LoadingCachedResult => "loading cached run",
            RunStage::BuildingRateTable => "building rate table",
            RunStage::Simulating => "simulating",
            RunStage::SavingResults => "saving results",
            RunStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}
