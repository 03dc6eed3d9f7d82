//! Pre-commit gate over the staged index.

use gate_core::GateStage;

fn main() {
    std::process::exit(gate_cli::run(GateStage::PreCommit));
}
