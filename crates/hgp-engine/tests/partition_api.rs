use hgp_config::{Context, ContextBuilder, Mode, Objective};
use hgp_core::{BlockId, ErrorClass};
use hgp_engine::{improve_partition, partition, CsrHypergraph};

fn block(raw: u32) -> BlockId {
    BlockId::from_raw(raw)
}

fn csr<'a>(num_vertices: usize, offsets: &'a [usize], pins: &'a [u32]) -> CsrHypergraph<'a> {
    CsrHypergraph {
        num_vertices,
        num_hyperedges: offsets.len() - 1,
        vertex_weights: None,
        hyperedge_weights: None,
        offsets,
        pins,
    }
}

fn context() -> Context {
    ContextBuilder::new().seed(7).build().unwrap()
}

#[test]
fn two_disjoint_pairs_are_separated() {
    let hypergraph = csr(4, &[0, 2, 4], &[0, 1, 2, 3]);
    let output = partition(&hypergraph, 0.03, 2, &context()).unwrap();

    assert_eq!(output.objective, 0);
    assert_eq!(output.blocks.len(), 4);
    assert_eq!(output.blocks[0], output.blocks[1]);
    assert_eq!(output.blocks[2], output.blocks[3]);
    assert_ne!(output.blocks[0], output.blocks[2]);
}

#[test]
fn single_triple_edge_is_cut_with_its_weight() {
    let weights = [5];
    let hypergraph = CsrHypergraph {
        hyperedge_weights: Some(&weights[..]),
        ..csr(3, &[0, 3], &[0, 1, 2])
    };
    for objective in [Objective::Cut, Objective::Km1] {
        let ctx = ContextBuilder::new().objective(objective).build().unwrap();
        let output = partition(&hypergraph, 1.0, 2, &ctx).unwrap();

        assert_eq!(output.objective, 5);
        let zeros = output.blocks.iter().filter(|b| **b == block(0)).count();
        assert!(zeros == 1 || zeros == 2, "blocks {:?}", output.blocks);
    }
}

#[test]
fn malformed_csr_is_a_precondition_error() {
    let hypergraph = csr(3, &[0, 2, 1], &[0, 1, 2]);
    let err = partition(&hypergraph, 0.03, 2, &context()).unwrap_err();
    assert_eq!(err.class(), ErrorClass::PreconditionViolation);
}

#[test]
fn invalid_k_is_rejected_before_running() {
    let hypergraph = csr(4, &[0, 2, 4], &[0, 1, 2, 3]);
    let err = partition(&hypergraph, 0.03, 1, &context()).unwrap_err();
    assert_eq!(err.class(), ErrorClass::ConfigurationError);
    assert_eq!(err.code(), "k-too-small");
}

#[test]
fn improve_rejects_a_missing_block() {
    let hypergraph = csr(4, &[0, 2, 4], &[0, 1, 2, 3]);
    let input = [block(0), block(0), block(0), block(0)];
    let err = improve_partition(&hypergraph, 0.03, 2, &input, 1, &context()).unwrap_err();
    assert_eq!(err.code(), "missing-block");
    assert_eq!(err.class(), ErrorClass::PreconditionViolation);
}

#[test]
fn improve_rejects_recursive_mode() {
    let hypergraph = csr(4, &[0, 2, 4], &[0, 1, 2, 3]);
    let input = [block(0), block(1), block(0), block(1)];
    let ctx = ContextBuilder::new().mode(Mode::Recursive).build().unwrap();
    let err = improve_partition(&hypergraph, 0.03, 2, &input, 1, &ctx).unwrap_err();
    assert_eq!(err.code(), "mode-mismatch");
}

#[test]
fn improve_rejects_bad_input_shapes() {
    let hypergraph = csr(4, &[0, 2, 4], &[0, 1, 2, 3]);
    let short = [block(0), block(1)];
    let err = improve_partition(&hypergraph, 0.03, 2, &short, 1, &context()).unwrap_err();
    assert_eq!(err.code(), "partition-length");

    let out_of_range = [block(0), block(1), block(2), block(1)];
    let err = improve_partition(&hypergraph, 0.03, 2, &out_of_range, 1, &context()).unwrap_err();
    assert_eq!(err.code(), "block-out-of-range");
}

#[test]
fn improve_never_returns_a_worse_partition() {
    // Two triangles of 2-pin edges joined by one edge; the input splits both.
    let offsets = [0, 2, 4, 6, 8, 10, 12, 14];
    let pins = [0, 1, 1, 2, 0, 2, 3, 4, 4, 5, 3, 5, 2, 3];
    let hypergraph = csr(6, &offsets, &pins);
    let input = [block(0), block(1), block(0), block(1), block(0), block(1)];
    let output = improve_partition(&hypergraph, 0.03, 2, &input, 2, &context()).unwrap();

    assert!(output.objective <= 5);
    let zeros = output.blocks.iter().filter(|b| **b == block(0)).count();
    assert_eq!(zeros, 3);
}

#[test]
fn zero_improvement_rounds_return_the_input() {
    let hypergraph = csr(4, &[0, 2, 4], &[0, 1, 2, 3]);
    let input = [block(0), block(1), block(0), block(1)];
    let output = improve_partition(&hypergraph, 0.03, 2, &input, 0, &context()).unwrap();
    assert_eq!(output.blocks, input.to_vec());
    assert_eq!(output.objective, 2);
}
