//! Pre-push gate over the upstream..HEAD commit range.

use gate_core::GateStage;

fn main() {
    std::process::exit(gate_cli::run(GateStage::PrePush));
}
