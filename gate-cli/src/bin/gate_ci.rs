//! CI gate over the base-branch..HEAD commit range.

use gate_core::GateStage;

fn main() {
    std::process::exit(gate_cli::run(GateStage::Ci));
}
