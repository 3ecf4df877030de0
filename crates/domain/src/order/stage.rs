/// Progress of one order placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStage {
    Started,
    Validated,
    Locked,
    StockChecked,
    Persisted,
    Committed,
    RolledBack,
}

impl PlacementStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementStage::Started => "started",
            PlacementStage::Validated => "validated",
            PlacementStage::Locked => "locked",
            PlacementStage::StockChecked => "stock_checked",
            PlacementStage::Persisted => "persisted",
            PlacementStage::Committed => "committed",
            PlacementStage::RolledBack => "rolled_back",
        }
    }
}

impl std::fmt::Display for PlacementStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
