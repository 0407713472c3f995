//! Integration tests for the retained-mode batch.

use std::cell::RefCell;
use std::rc::Rc;

use starling_graphics::{
    AttributeData, AttributeKind, Batch, DrawCall, DrawMode, DrawSink, GraphicsError, RenderState,
    immediate,
};

/// Shared event log recording state hooks and draw submissions in order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Activate(&'static str),
    Draw { vertices: u32, indexed: bool },
    Deactivate(&'static str),
}

type Log = Rc<RefCell<Vec<Event>>>;

struct NamedState {
    name: &'static str,
    log: Log,
}

impl RenderState for NamedState {
    fn activate(&self) {
        self.log.borrow_mut().push(Event::Activate(self.name));
    }

    fn deactivate(&self) {
        self.log.borrow_mut().push(Event::Deactivate(self.name));
    }
}

fn named_state(name: &'static str, log: &Log) -> Rc<dyn RenderState> {
    Rc::new(NamedState {
        name,
        log: Rc::clone(log),
    })
}

/// Sink recording every submission, with owned copies of the call data.
#[derive(Default)]
struct RecordingSink {
    log: Option<Log>,
    calls: Vec<RecordedCall>,
}

struct RecordedCall {
    mode: DrawMode,
    first_vertex: u32,
    vertex_count: u32,
    attributes: Vec<(AttributeKind, Vec<u8>)>,
    indices: Option<Vec<u32>>,
}

impl RecordingSink {
    fn new() -> Self {
        Self::default()
    }

    fn with_log(log: &Log) -> Self {
        Self {
            log: Some(Rc::clone(log)),
            calls: Vec::new(),
        }
    }
}

impl DrawSink for RecordingSink {
    fn submit(&mut self, call: &DrawCall<'_>) {
        if let Some(log) = &self.log {
            log.borrow_mut().push(Event::Draw {
                vertices: call.vertex_count,
                indexed: call.indices.is_some(),
            });
        }
        self.calls.push(RecordedCall {
            mode: call.mode,
            first_vertex: call.first_vertex,
            vertex_count: call.vertex_count,
            attributes: call
                .attributes
                .iter()
                .map(|binding| (binding.spec.kind, binding.bytes.to_vec()))
                .collect(),
            indices: call
                .indices
                .as_ref()
                .map(|binding| bytemuck::cast_slice::<u8, u32>(binding.bytes).to_vec()),
        });
    }
}

const TRI_POSITIONS: [f32; 6] = [0.0, 0.0, 1.0, 0.0, 0.5, 1.0];
const TRI_COLORS: [u8; 9] = [255, 0, 0, 0, 255, 0, 0, 0, 255];

#[test]
fn attribute_round_trip() {
    let mut batch = Batch::new();
    let tri = batch
        .add(
            3,
            DrawMode::Triangles,
            None,
            &[
                ("v2f", AttributeData::from(&TRI_POSITIONS)),
                ("c3B", AttributeData::from(&TRI_COLORS)),
            ],
        )
        .unwrap();

    assert_eq!(
        batch.attribute::<f32>(tri, AttributeKind::Position).unwrap(),
        TRI_POSITIONS.to_vec()
    );
    assert_eq!(
        batch.attribute::<u8>(tri, AttributeKind::Color).unwrap(),
        TRI_COLORS.to_vec()
    );
}

#[test]
fn mutation_is_isolated_between_primitives() {
    let mut batch = Batch::new();
    let a = batch
        .add(3, DrawMode::Triangles, None, &[("v2f", AttributeData::from(&TRI_POSITIONS))])
        .unwrap();
    let b = batch
        .add(3, DrawMode::Triangles, None, &[("v2f", AttributeData::from(&TRI_POSITIONS))])
        .unwrap();

    let moved = [9.0f32, 9.0, 8.0, 8.0, 7.0, 7.0];
    batch
        .set_attribute(a, AttributeKind::Position, &AttributeData::from(&moved))
        .unwrap();
    batch
        .set_attribute_element(
            a,
            AttributeKind::Position,
            2,
            &AttributeData::from(&[1.5f32, 1.5]),
        )
        .unwrap();

    assert_eq!(
        batch.attribute::<f32>(a, AttributeKind::Position).unwrap(),
        vec![9.0, 9.0, 8.0, 8.0, 1.5, 1.5]
    );
    // b's data is untouched
    assert_eq!(
        batch.attribute::<f32>(b, AttributeKind::Position).unwrap(),
        TRI_POSITIONS.to_vec()
    );
}

#[test]
fn triangle_and_textured_quad_scenario() {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let texture_state = named_state("texture", &log);

    let mut batch = Batch::new();
    batch
        .add(
            3,
            DrawMode::Triangles,
            None,
            &[
                ("v2f", AttributeData::from(&TRI_POSITIONS)),
                ("c3B", AttributeData::from(&TRI_COLORS)),
            ],
        )
        .unwrap();

    let quad_positions = [0.0f32, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
    let quad_uvs = [0.0f32, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
    batch
        .add_indexed(
            4,
            DrawMode::Triangles,
            &[0, 1, 2, 2, 3, 0],
            Some(texture_state),
            &[
                ("v2f", AttributeData::from(&quad_positions)),
                ("t2f", AttributeData::from(&quad_uvs)),
            ],
        )
        .unwrap();

    let mut sink = RecordingSink::with_log(&log);
    let stats = batch.draw(&mut sink);

    assert_eq!(stats.groups, 2);
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.state_changes, 1);

    // Exactly one activate/deactivate pair, bracketing the quad's draw
    let events = log.borrow();
    let activates = events
        .iter()
        .filter(|e| matches!(e, Event::Activate(_)))
        .count();
    let deactivates = events
        .iter()
        .filter(|e| matches!(e, Event::Deactivate(_)))
        .count();
    assert_eq!(activates, 1);
    assert_eq!(deactivates, 1);

    let activate_at = events
        .iter()
        .position(|e| *e == Event::Activate("texture"))
        .unwrap();
    let quad_draw_at = events
        .iter()
        .position(|e| {
            *e == Event::Draw {
                vertices: 4,
                indexed: true,
            }
        })
        .unwrap();
    let deactivate_at = events
        .iter()
        .position(|e| *e == Event::Deactivate("texture"))
        .unwrap();
    assert!(activate_at < quad_draw_at && quad_draw_at < deactivate_at);
}

#[test]
fn hooks_fire_every_draw_call() {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let state = named_state("blend", &log);

    let mut batch = Batch::new();
    batch
        .add(
            3,
            DrawMode::Triangles,
            Some(Rc::clone(&state)),
            &[("v2f", AttributeData::from(&TRI_POSITIONS))],
        )
        .unwrap();

    let mut sink = RecordingSink::with_log(&log);
    batch.draw(&mut sink);
    batch.draw(&mut sink);

    let events = log.borrow();
    let pairs = events
        .iter()
        .filter(|e| matches!(e, Event::Activate(_)))
        .count();
    assert_eq!(pairs, 2);
}

#[test]
fn value_equal_states_group_separately() {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    // Two states with identical contents but distinct allocations
    let a = named_state("same", &log);
    let b = named_state("same", &log);

    let mut batch = Batch::new();
    batch
        .add(3, DrawMode::Triangles, Some(a), &[("v2f", AttributeData::from(&TRI_POSITIONS))])
        .unwrap();
    batch
        .add(3, DrawMode::Triangles, Some(b), &[("v2f", AttributeData::from(&TRI_POSITIONS))])
        .unwrap();

    assert_eq!(batch.group_count(), 2);
    let mut sink = RecordingSink::new();
    let stats = batch.draw(&mut sink);
    assert_eq!(stats.state_changes, 2);
}

#[test]
fn shared_state_groups_together() {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let state = named_state("shared", &log);

    let mut batch = Batch::new();
    for _ in 0..4 {
        batch
            .add(
                3,
                DrawMode::Triangles,
                Some(Rc::clone(&state)),
                &[("v2f", AttributeData::from(&TRI_POSITIONS))],
            )
            .unwrap();
    }

    assert_eq!(batch.group_count(), 1);
    let mut sink = RecordingSink::new();
    let stats = batch.draw(&mut sink);
    assert_eq!(stats.draw_calls, 4);
    assert_eq!(stats.state_changes, 1);
}

#[test]
fn length_mismatch_leaves_batch_unchanged() {
    let mut batch = Batch::new();
    let tri = batch
        .add(
            3,
            DrawMode::Triangles,
            None,
            &[
                ("v2f", AttributeData::from(&TRI_POSITIONS)),
                ("c3B", AttributeData::from(&TRI_COLORS)),
            ],
        )
        .unwrap();

    // 4 color triples for a 3-vertex primitive
    let bad_colors = [0u8; 12];
    let err = batch
        .add(
            3,
            DrawMode::Triangles,
            None,
            &[
                ("v2f", AttributeData::from(&TRI_POSITIONS)),
                ("c3B", AttributeData::from(&bad_colors)),
            ],
        )
        .unwrap_err();
    assert_eq!(
        err,
        GraphicsError::LengthMismatch {
            expected: 9,
            actual: 12
        }
    );

    // A failed set_attribute must not partially write either
    let err = batch
        .set_attribute(tri, AttributeKind::Color, &AttributeData::from(&bad_colors))
        .unwrap_err();
    assert!(matches!(err, GraphicsError::LengthMismatch { .. }));

    assert_eq!(batch.primitive_count(), 1);
    assert_eq!(
        batch.attribute::<u8>(tri, AttributeKind::Color).unwrap(),
        TRI_COLORS.to_vec()
    );

    let mut sink = RecordingSink::new();
    let stats = batch.draw(&mut sink);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(sink.calls[0].vertex_count, 3);
}

#[test]
fn type_mismatch_is_rejected() {
    let mut batch = Batch::new();
    let floats = [0.0f32; 9];
    let err = batch
        .add(3, DrawMode::Triangles, None, &[("c3B", AttributeData::from(&floats))])
        .unwrap_err();
    assert!(matches!(err, GraphicsError::TypeMismatch { .. }));
    assert_eq!(batch.group_count(), 0);
}

#[test]
fn removed_primitive_slots_are_reused() {
    let mut batch = Batch::new();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let positions = [i as f32; 6];
            batch
                .add(3, DrawMode::Triangles, None, &[("v2f", AttributeData::from(&positions))])
                .unwrap()
        })
        .collect();

    let capacity_before = batch.groups().next().unwrap().vertex_capacity();

    // Remove every other primitive, then add replacements
    for handle in handles.iter().step_by(2) {
        batch.remove(*handle).unwrap();
    }
    for i in 0..4 {
        let positions = [100.0 + i as f32; 6];
        batch
            .add(3, DrawMode::Triangles, None, &[("v2f", AttributeData::from(&positions))])
            .unwrap();
    }

    // Freed space was reused: no growth needed for same-size replacements
    let group = batch.groups().next().unwrap();
    assert_eq!(group.vertex_capacity(), capacity_before);
    assert_eq!(group.live_vertices(), 24);

    // Survivors kept their data, replacements never see stale bytes
    for (i, handle) in handles.iter().enumerate().filter(|(i, _)| i % 2 == 1) {
        assert_eq!(
            batch.attribute::<f32>(*handle, AttributeKind::Position).unwrap(),
            vec![i as f32; 6]
        );
    }

    let mut sink = RecordingSink::new();
    let stats = batch.draw(&mut sink);
    assert_eq!(stats.draw_calls, 8);
}

#[test]
fn stale_handles_error() {
    let mut batch = Batch::new();
    let tri = batch
        .add(3, DrawMode::Triangles, None, &[("v2f", AttributeData::from(&TRI_POSITIONS))])
        .unwrap();
    batch.remove(tri).unwrap();

    assert_eq!(
        batch.set_attribute(tri, AttributeKind::Position, &AttributeData::from(&TRI_POSITIONS)),
        Err(GraphicsError::InvalidHandle)
    );
    assert_eq!(batch.remove(tri), Err(GraphicsError::InvalidHandle));
    assert!(batch.attribute::<f32>(tri, AttributeKind::Position).is_err());
}

#[test]
fn empty_groups_are_retained_until_pruned() {
    let mut batch = Batch::new();
    let tri = batch
        .add(3, DrawMode::Triangles, None, &[("v2f", AttributeData::from(&TRI_POSITIONS))])
        .unwrap();
    batch.remove(tri).unwrap();

    // The group survives its last primitive and contributes nothing
    assert_eq!(batch.group_count(), 1);
    let mut sink = RecordingSink::new();
    let stats = batch.draw(&mut sink);
    assert_eq!(stats.draw_calls, 0);
    assert_eq!(stats.state_changes, 0);

    batch.prune_empty_groups();
    assert_eq!(batch.group_count(), 0);
}

#[test]
fn indices_are_rebased_into_the_shared_buffer() {
    let mut batch = Batch::new();
    let quad_positions = [0.0f32, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
    let quad_indices = [0u32, 1, 2, 2, 3, 0];

    let a = batch
        .add_indexed(
            4,
            DrawMode::Triangles,
            &quad_indices,
            None,
            &[("v2f", AttributeData::from(&quad_positions))],
        )
        .unwrap();
    let b = batch
        .add_indexed(
            4,
            DrawMode::Triangles,
            &quad_indices,
            None,
            &[("v2f", AttributeData::from(&quad_positions))],
        )
        .unwrap();

    // Read-back is primitive-local for both
    assert_eq!(batch.indices(a).unwrap(), quad_indices.to_vec());
    assert_eq!(batch.indices(b).unwrap(), quad_indices.to_vec());

    // Submitted indices point at each primitive's own vertex run
    let mut sink = RecordingSink::new();
    batch.draw(&mut sink);
    assert_eq!(sink.calls.len(), 2);
    for call in &sink.calls {
        let submitted = call.indices.as_ref().unwrap();
        let rebased: Vec<u32> = quad_indices.iter().map(|&i| i + call.first_vertex).collect();
        assert_eq!(submitted, &rebased);
    }
    assert_ne!(sink.calls[0].first_vertex, sink.calls[1].first_vertex);
}

#[test]
fn index_values_must_stay_in_the_primitive() {
    let mut batch = Batch::new();
    let quad_positions = [0.0f32, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];

    let err = batch
        .add_indexed(
            4,
            DrawMode::Triangles,
            &[0, 1, 4],
            None,
            &[("v2f", AttributeData::from(&quad_positions))],
        )
        .unwrap_err();
    assert!(matches!(err, GraphicsError::OutOfRange { .. }));
    assert_eq!(batch.group_count(), 0);

    let quad = batch
        .add_indexed(
            4,
            DrawMode::Triangles,
            &[0, 1, 2, 2, 3, 0],
            None,
            &[("v2f", AttributeData::from(&quad_positions))],
        )
        .unwrap();

    // In-place index rewrite: fixed count, bounded values
    batch.set_indices(quad, &[3, 2, 1, 1, 0, 3]).unwrap();
    assert_eq!(batch.indices(quad).unwrap(), vec![3, 2, 1, 1, 0, 3]);
    assert!(matches!(
        batch.set_indices(quad, &[0, 1]),
        Err(GraphicsError::LengthMismatch { .. })
    ));
    assert!(matches!(
        batch.set_indices(quad, &[0, 1, 2, 2, 3, 9]),
        Err(GraphicsError::OutOfRange { .. })
    ));
}

#[test]
fn growth_preserves_existing_primitives() {
    let mut batch = Batch::new();
    let mut handles = Vec::new();

    // Enough primitives to force several buffer growth steps
    for i in 0..50 {
        let positions = [i as f32; 6];
        handles.push(
            batch
                .add(3, DrawMode::Triangles, None, &[("v2f", AttributeData::from(&positions))])
                .unwrap(),
        );
    }

    for (i, handle) in handles.iter().enumerate() {
        assert_eq!(
            batch.attribute::<f32>(*handle, AttributeKind::Position).unwrap(),
            vec![i as f32; 6]
        );
    }

    // Capacity stays within the geometric growth bound
    let group = batch.groups().next().unwrap();
    assert_eq!(group.live_vertices(), 150);
    assert!(group.vertex_capacity() <= 2 * 150);
}

#[test]
fn draw_submits_recorded_bytes() {
    let mut batch = Batch::new();
    batch
        .add(
            3,
            DrawMode::Triangles,
            None,
            &[
                ("v2f", AttributeData::from(&TRI_POSITIONS)),
                ("c3B", AttributeData::from(&TRI_COLORS)),
            ],
        )
        .unwrap();

    let mut sink = RecordingSink::new();
    batch.draw(&mut sink);

    let call = &sink.calls[0];
    assert_eq!(call.mode, DrawMode::Triangles);
    let (_, position_bytes) = call
        .attributes
        .iter()
        .find(|(kind, _)| *kind == AttributeKind::Position)
        .unwrap();
    assert_eq!(
        bytemuck::cast_slice::<u8, f32>(position_bytes),
        &TRI_POSITIONS
    );
    let (_, color_bytes) = call
        .attributes
        .iter()
        .find(|(kind, _)| *kind == AttributeKind::Color)
        .unwrap();
    assert_eq!(color_bytes.as_slice(), &TRI_COLORS);
}

#[test]
fn immediate_draw_submits_without_retention() {
    let mut sink = RecordingSink::new();
    immediate::draw(
        3,
        DrawMode::LineStrip,
        &[("v2f", AttributeData::from(&TRI_POSITIONS))],
        &mut sink,
    )
    .unwrap();

    assert_eq!(sink.calls.len(), 1);
    assert_eq!(sink.calls[0].mode, DrawMode::LineStrip);
    assert_eq!(sink.calls[0].first_vertex, 0);

    immediate::draw_indexed(
        4,
        DrawMode::Triangles,
        &[0, 1, 2, 2, 3, 0],
        &[("v2f", AttributeData::from(&[0.0f32; 8]))],
        &mut sink,
    )
    .unwrap();
    assert_eq!(sink.calls[1].indices.as_ref().unwrap(), &vec![0, 1, 2, 2, 3, 0]);

    // Validation matches the retained path
    assert!(matches!(
        immediate::draw(
            3,
            DrawMode::Triangles,
            &[("v2f", AttributeData::from(&[0.0f32; 4]))],
            &mut sink,
        ),
        Err(GraphicsError::LengthMismatch { .. })
    ));
}
