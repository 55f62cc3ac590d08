use crate::{
    types::VerificationTarget,
    verifier::{Verification, VerificationError, Verifier},
};
use ethabi::Address;

#[derive(Debug)]
pub struct TargetOutcome {
    pub address: Address,
    pub result: Result<Verification, VerificationError>,
}

/// Outcomes of all targets in the order they were processed.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<TargetOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_ok())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

#[derive(Debug)]
pub enum ProcessOutcome {
    /// All targets have been attempted, whatever their individual results are.
    Completed(RunReport),
    /// An error occurred outside of any single target verification.
    Fatal(anyhow::Error),
}

impl ProcessOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            ProcessOutcome::Completed(_) => 0,
            ProcessOutcome::Fatal(_) => 1,
        }
    }
}

impl From<anyhow::Result<RunReport>> for ProcessOutcome {
    fn from(result: anyhow::Result<RunReport>) -> Self {
        match result {
            Ok(report) => ProcessOutcome::Completed(report),
            Err(err) => ProcessOutcome::Fatal(err),
        }
    }
}

/// Verifies targets one by one in the given order. Failure of a target
/// is logged and recorded, and never prevents the following targets
/// from being attempted. Each target is attempted exactly once.
pub async fn run<V: Verifier + ?Sized>(verifier: &V, targets: &[VerificationTarget]) -> RunReport {
    let mut outcomes = Vec::with_capacity(targets.len());
    for target in targets {
        let address = target.display_address();
        log::info!("verifying contract; address={address}");

        let result = verifier.verify(target).await;
        match &result {
            Ok(verification) => log::info!(
                "contract verified; address={address}, contract={}",
                verification.contract_name
            ),
            Err(err) => {
                log::error!("contract verification failed; address={address}, error={err}")
            }
        }

        outcomes.push(TargetOutcome {
            address: target.address,
            result,
        });
    }

    let report = RunReport { outcomes };
    log::info!(
        "verification finished; total={}, succeeded={}, failed={}",
        report.outcomes.len(),
        report.succeeded(),
        report.failed()
    );
    report
}
