//! End-to-end view-change acceptance against shared committees.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use vcblock_bft::{SharedCommittee, ViewChangeConfig, ViewChangeProcessor};
use vcblock_test_helpers::{first_signers, TestCommittee};
use vcblock_types::{Committee, CommitteeMember, Epoch, QuorumRule, SupermajorityQuorum};

fn processor() -> ViewChangeProcessor {
    ViewChangeProcessor::with_bls(ViewChangeConfig::default(), Arc::new(SupermajorityQuorum))
}

fn rotated_left(members: &[CommitteeMember], by: usize) -> Vec<CommitteeMember> {
    let mut out = members.to_vec();
    out.rotate_left(by % members.len());
    out
}

fn members(committee: &Committee) -> Vec<CommitteeMember> {
    committee.iter().copied().collect()
}

/// Accepting counter k leaves the committee rotated left by k mod N and
/// nothing else changed.
#[test]
fn test_accepted_proof_rotates_by_counter_mod_size() {
    for size in [1usize, 4, 7] {
        let fixture = TestCommittee::new(size);
        let quorum = SupermajorityQuorum.num_for_consensus(size);

        for counter in 0..(2 * size as u32 + 1) {
            let shared = SharedCommittee::new(fixture.committee());
            let proof = fixture.proof_for(&shared.snapshot(), 3, counter, &first_signers(quorum));

            assert!(
                processor().process_view_change_proof(&proof, Epoch(3), &shared),
                "size {size} counter {counter} should be accepted"
            );
            assert_eq!(
                members(&shared.snapshot()),
                rotated_left(fixture.members(), counter as usize),
                "size {size} counter {counter}"
            );
            assert_eq!(shared.rotations(), (counter as usize % size) as u64);
        }
    }
}

/// One below the threshold never changes the committee.
#[test]
fn test_below_threshold_never_mutates() {
    for size in [4usize, 5, 7] {
        let fixture = TestCommittee::new(size);
        let quorum = SupermajorityQuorum.num_for_consensus(size);
        let shared = SharedCommittee::new(fixture.committee());

        let proof = fixture.proof_for(&shared.snapshot(), 1, 1, &first_signers(quorum - 1));
        assert!(!processor().process_view_change_proof(&proof, Epoch(1), &shared));
        assert_eq!(shared.snapshot(), fixture.committee());
    }
}

/// The same proof submitted from two threads is applied exactly once.
#[test]
fn test_concurrent_duplicate_proof_applies_once() {
    let fixture = TestCommittee::new(5);
    let shared = SharedCommittee::new(fixture.committee());
    let proof = fixture.proof_for(&shared.snapshot(), 2, 2, &first_signers(4));
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let shared = shared.clone();
            let proof = proof.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                processor().process_view_change_proof(&proof, Epoch(2), &shared)
            })
        })
        .collect();

    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|accepted| *accepted)
        .count();

    assert_eq!(accepted, 1);
    assert_eq!(shared.rotations(), 2);
    assert_eq!(shared.leader(), fixture.member(2));
}

/// Readers only ever observe the committee between whole proofs, never a
/// state partway through a multi-step rotation.
#[test]
fn test_readers_never_observe_partial_rotation() {
    let fixture = TestCommittee::new(5);

    // Build a chain of proofs against a scratch committee, recording the
    // rotation total and member order after each one.
    let scratch = SharedCommittee::new(fixture.committee());
    let mut proofs = Vec::new();
    let mut settled = vec![(0u64, fixture.members().to_vec())];
    for counter in [1u32, 3, 4, 2, 0, 3] {
        let proof = fixture.proof_for(&scratch.snapshot(), 5, counter, &first_signers(4));
        assert!(processor().process_view_change_proof(&proof, Epoch(5), &scratch));
        proofs.push(proof);
        let committee = scratch.snapshot();
        settled.push((committee.rotations(), members(&committee)));
    }
    // Totals 0, 1, 4, 8, 10, 10, 13: every multi-step proof has
    // intermediate totals that must never be seen.
    assert_eq!(
        settled.iter().map(|(r, _)| *r).collect::<Vec<_>>(),
        vec![0, 1, 4, 8, 10, 10, 13]
    );
    let settled = Arc::new(settled);

    let shared = SharedCommittee::new(fixture.committee());
    let done = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..3)
        .map(|_| {
            let shared = shared.clone();
            let done = done.clone();
            let settled = settled.clone();
            thread::spawn(move || {
                let mut observations = 0u64;
                while !done.load(Ordering::Acquire) {
                    let committee = shared.read();
                    let observed = (committee.rotations(), members(&committee));
                    drop(committee);
                    assert!(
                        settled.contains(&observed),
                        "observed mid-rotation state after {} rotations",
                        observed.0
                    );
                    observations += 1;
                    thread::yield_now();
                }
                observations
            })
        })
        .collect();

    for proof in &proofs {
        assert!(processor().process_view_change_proof(proof, Epoch(5), &shared));
        thread::yield_now();
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(shared.snapshot(), scratch.snapshot());
    assert_eq!(shared.rotations(), 13);
}
