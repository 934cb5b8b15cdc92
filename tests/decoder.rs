//! End-to-end decodes over small hand-built graphs and scripted score
//! matrices.

use trellis::decoder::Decoder;
use trellis::fst::{Arc, EPSILON, Label, StateId, VectorFst};
use trellis::opts::DecoderOpts;
use trellis::scorer::MatrixScorer;

fn arc(ilabel: Label, olabel: Label, next_state: StateId, weight: f32) -> Arc {
    Arc {
        ilabel,
        olabel,
        next_state,
        weight,
    }
}

#[test]
fn accepts_a_single_word() -> anyhow::Result<()> {
    // 0 -1:42-> 1(final), one frame scoring label 1 at loglik 0.
    let mut fst = VectorFst::new();
    let s0 = fst.add_state();
    let s1 = fst.add_state();
    fst.set_start(s0)?;
    fst.set_final(s1, 0.0)?;
    fst.add_arc(s0, arc(1, 42, s1, 0.0))?;

    let scorer = MatrixScorer::from_rows(vec![vec![0.0]])?;
    let mut decoder = Decoder::new(&fst);

    assert!(decoder.decode(&scorer)?);
    let hyp = decoder.best_path();
    assert_eq!(hyp.words, vec![42]);
    assert_eq!(hyp.weight, 0.0);
    Ok(())
}

#[test]
fn epsilon_closure_runs_before_the_first_frame() -> anyhow::Result<()> {
    // The word is emitted on an epsilon-input arc that must be traversed
    // before any acoustic frame is consumed.
    let mut fst = VectorFst::new();
    let s0 = fst.add_state();
    let s1 = fst.add_state();
    let s2 = fst.add_state();
    fst.set_start(s0)?;
    fst.set_final(s2, 0.0)?;
    fst.add_arc(s0, arc(EPSILON, 7, s1, 0.0))?;
    fst.add_arc(s1, arc(1, EPSILON, s2, 0.0))?;

    let scorer = MatrixScorer::from_rows(vec![vec![0.0]])?;
    let mut decoder = Decoder::new(&fst);

    assert!(decoder.decode(&scorer)?);
    let hyp = decoder.best_path();
    assert_eq!(hyp.words, vec![7]);
    assert_eq!(hyp.weight, 0.0);
    Ok(())
}

#[test]
fn merging_at_a_shared_state_keeps_the_cheaper_path() -> anyhow::Result<()> {
    // Two arcs land on state 1 in the same frame with costs 2.0 and 3.5; the
    // surviving token must carry the cheaper cost and the cheaper path's word.
    let mut fst = VectorFst::new();
    let s0 = fst.add_state();
    let s1 = fst.add_state();
    fst.set_start(s0)?;
    fst.set_final(s1, 0.0)?;
    fst.add_arc(s0, arc(1, 10, s1, 2.0))?;
    fst.add_arc(s0, arc(2, 20, s1, 3.5))?;

    let scorer = MatrixScorer::from_rows(vec![vec![0.0, 0.0]])?;
    let mut decoder = Decoder::new(&fst);

    assert!(decoder.decode(&scorer)?);
    let hyp = decoder.best_path();
    assert_eq!(hyp.words, vec![10]);
    assert_eq!(hyp.weight, 2.0);
    Ok(())
}

#[test]
fn tokens_beyond_the_beam_are_pruned() -> anyhow::Result<()> {
    // Frame 1 creates three tokens with costs {0.0, 0.5, 2.0} under beam 1.0,
    // so the 2.0 token never materializes. Frame 2 then offers that pruned
    // path a huge reward; if pruning failed, it would win outright.
    let mut fst = VectorFst::new();
    let s0 = fst.add_state();
    let cheap = fst.add_state();
    let mid = fst.add_state();
    let expensive = fst.add_state();
    let done = fst.add_state();
    fst.set_start(s0)?;
    fst.set_final(done, 0.0)?;
    fst.add_arc(s0, arc(1, 11, cheap, 0.0))?;
    fst.add_arc(s0, arc(2, 12, mid, 0.5))?;
    fst.add_arc(s0, arc(3, 13, expensive, 2.0))?;
    fst.add_arc(cheap, arc(4, EPSILON, done, 0.0))?;
    fst.add_arc(mid, arc(4, EPSILON, done, 0.0))?;
    fst.add_arc(expensive, arc(5, EPSILON, done, 0.0))?;

    let scorer = MatrixScorer::from_rows(vec![
        vec![0.0, 0.0, 0.0, 0.0, 0.0],
        // Label 5 (the pruned path's continuation) scores far better than
        // label 4.
        vec![0.0, 0.0, 0.0, 0.0, 100.0],
    ])?;

    let opts = DecoderOpts {
        beam: 1.0,
        ..DecoderOpts::default()
    };
    let mut decoder = Decoder::with_opts(&fst, opts);

    assert!(decoder.decode(&scorer)?);
    let hyp = decoder.best_path();
    assert_eq!(hyp.words, vec![11], "the pruned path must not win");
    assert_eq!(hyp.weight, 0.0);
    Ok(())
}

#[test]
fn a_dead_beam_reports_no_path() -> anyhow::Result<()> {
    // State 1 has no outgoing arcs, so the beam dies on frame 2 of 3. The
    // decode must finish cleanly and report failure.
    let mut fst = VectorFst::new();
    let s0 = fst.add_state();
    let s1 = fst.add_state();
    fst.set_start(s0)?;
    fst.add_arc(s0, arc(1, 10, s1, 0.0))?;

    let scorer = MatrixScorer::from_rows(vec![vec![0.0], vec![0.0], vec![0.0]])?;
    let mut decoder = Decoder::new(&fst);

    assert!(!decoder.decode(&scorer)?);
    let hyp = decoder.best_path();
    assert!(hyp.is_empty());
    assert_eq!(hyp.weight, 0.0);
    Ok(())
}

#[test]
fn zero_frame_utterances_decode_to_nothing() -> anyhow::Result<()> {
    let mut fst = VectorFst::new();
    let s0 = fst.add_state();
    let s1 = fst.add_state();
    fst.set_start(s0)?;
    fst.set_final(s1, 0.0)?;
    fst.add_arc(s0, arc(1, 10, s1, 0.0))?;

    let scorer = MatrixScorer::from_rows(vec![])?;
    let mut decoder = Decoder::new(&fst);

    assert!(!decoder.decode(&scorer)?);
    let hyp = decoder.best_path();
    assert!(hyp.is_empty());
    assert_eq!(hyp.weight, 0.0);
    Ok(())
}

#[test]
fn a_final_start_state_accepts_the_empty_utterance() -> anyhow::Result<()> {
    let mut fst = VectorFst::new();
    let s0 = fst.add_state();
    fst.set_start(s0)?;
    fst.set_final(s0, 1.5)?;

    let scorer = MatrixScorer::from_rows(vec![])?;
    let mut decoder = Decoder::new(&fst);

    assert!(!decoder.decode(&scorer)?);
    let hyp = decoder.best_path();
    assert!(hyp.words.is_empty());
    assert_eq!(hyp.weight, 1.5);
    Ok(())
}

#[test]
fn best_path_is_idempotent() -> anyhow::Result<()> {
    let mut fst = VectorFst::new();
    let s0 = fst.add_state();
    let s1 = fst.add_state();
    fst.set_start(s0)?;
    fst.set_final(s1, 0.25)?;
    fst.add_arc(s0, arc(1, 5, s1, 0.5))?;

    let scorer = MatrixScorer::from_rows(vec![vec![-0.75]])?;
    let mut decoder = Decoder::new(&fst);
    assert!(decoder.decode(&scorer)?);

    let first = decoder.best_path();
    let second = decoder.best_path();
    assert_eq!(first, second);
    assert_eq!(first.words, vec![5]);
    // Path cost + acoustic cost + final weight.
    assert!((first.weight - 1.5).abs() < 1e-6);
    Ok(())
}

#[test]
fn identical_inputs_decode_identically() -> anyhow::Result<()> {
    // A two-frame lattice wide enough to exercise merging and pruning; two
    // decoders over the same inputs must agree exactly.
    let mut fst = VectorFst::new();
    let s0 = fst.add_state();
    let mids: Vec<StateId> = (0..8).map(|_| fst.add_state()).collect();
    let done = fst.add_state();
    fst.set_start(s0)?;
    fst.set_final(done, 0.0)?;
    for (i, &mid) in mids.iter().enumerate() {
        let label = i as Label + 1;
        fst.add_arc(s0, arc(label, 100 + label, mid, i as f32 * 0.25))?;
        fst.add_arc(mid, arc(label, EPSILON, done, 0.0))?;
    }

    let frame: Vec<f32> = (0..8).map(|i| -0.1 * i as f32).collect();
    let scorer = MatrixScorer::from_rows(vec![frame.clone(), frame])?;

    let mut a = Decoder::new(&fst);
    let mut b = Decoder::new(&fst);
    assert!(a.decode(&scorer)?);
    assert!(b.decode(&scorer)?);
    assert_eq!(a.best_path(), b.best_path());
    Ok(())
}

#[test]
fn repeated_decodes_on_one_decoder_are_independent() -> anyhow::Result<()> {
    let mut fst = VectorFst::new();
    let s0 = fst.add_state();
    let s1 = fst.add_state();
    fst.set_start(s0)?;
    fst.set_final(s1, 0.0)?;
    fst.add_arc(s0, arc(1, 42, s1, 0.0))?;

    let scorer = MatrixScorer::from_rows(vec![vec![0.0]])?;
    let mut decoder = Decoder::new(&fst);

    assert!(decoder.decode(&scorer)?);
    let first = decoder.best_path();
    assert!(decoder.decode(&scorer)?);
    let second = decoder.best_path();

    assert_eq!(first, second);
    assert_eq!(first.words, vec![42]);
    Ok(())
}

#[test]
fn final_weights_pick_the_terminating_state() -> anyhow::Result<()> {
    // Both states are reachable at the same path cost; only final weights
    // differ, so the hypothesis must come from the cheaper-to-terminate one.
    let mut fst = VectorFst::new();
    let s0 = fst.add_state();
    let s1 = fst.add_state();
    let s2 = fst.add_state();
    fst.set_start(s0)?;
    fst.set_final(s1, 3.0)?;
    fst.set_final(s2, 1.0)?;
    fst.add_arc(s0, arc(1, 10, s1, 0.0))?;
    fst.add_arc(s0, arc(2, 20, s2, 0.0))?;

    let scorer = MatrixScorer::from_rows(vec![vec![0.0, 0.0]])?;
    let mut decoder = Decoder::new(&fst);

    assert!(decoder.decode(&scorer)?);
    let hyp = decoder.best_path();
    assert_eq!(hyp.words, vec![20]);
    assert_eq!(hyp.weight, 1.0);
    Ok(())
}
