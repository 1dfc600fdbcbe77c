use rate_grid::{
    geometry::{distance, Point},
    grid::{generate_grid, CellSize, CellStatus},
    io::part::{decode_part_file, encode_part_file, RECORD_SIZE},
    snap::snap_to_cell,
    Block, EditorState, GridSettings, RateGridError,
};

const LAT: f64 = -27.945563;
const LNG: f64 = 25.661019;

#[test]
fn default_grid_has_hundred_cells() {
    let (cells, params) = generate_grid(Point::new(LAT, LNG), CellSize::new(100.0, 100.0), 10, 10);
    assert!(params.is_some());
    assert_eq!(cells.len(), 100);
    assert_eq!(cells[0].id, "0-0");
    assert_eq!(cells[99].id, "9-9");
    for (i, cell) in cells.iter().enumerate() {
        assert_eq!(cell.id, format!("{}-{}", i / 10, i % 10));
        assert_eq!(cell.status, CellStatus::Unselected);
    }
}

#[test]
fn cells_are_roughly_the_requested_size() {
    let (cells, _) = generate_grid(Point::new(LAT, LNG), CellSize::new(120.0, 80.0), 3, 4);
    for cell in &cells {
        let [tl, tr, br, _] = cell.coordinates;
        assert!((distance(tl, tr) - 120.0).abs() < 0.5);
        assert!((distance(tr, br) - 80.0).abs() < 0.5);
    }
}

#[test]
fn every_centre_snaps_to_its_own_cell() {
    let (cells, params) = generate_grid(Point::new(LAT, LNG), CellSize::new(75.0, 40.0), 6, 8);
    let params = params.unwrap();
    for cell in &cells {
        let found = snap_to_cell(cell.center.latitude, cell.center.longitude, &params, &cells);
        assert_eq!(found.map(|c| c.id.as_str()), Some(cell.id.as_str()));
    }
}

#[test]
fn adding_a_block_at_grid_centre() {
    let mut state = EditorState::with_settings(GridSettings::default()).unwrap();
    let id = state.add_block(LAT, LNG, 3000).unwrap().id.clone();
    assert_eq!(state.blocks().len(), 1);
    let cell = state.grid().unwrap().cell(&id).unwrap();
    assert_eq!(cell.status, CellStatus::Selected);
    assert_eq!(cell.target_rate, Some(3000));
}

#[test]
fn encoding_a_single_block() {
    let block = Block {
        id: "0-0".into(),
        target_rate: 3000,
        coordinates: vec![
            Point::new(-27.8, 25.6),
            Point::new(-27.8, 25.7),
            Point::new(-27.9, 25.7),
            Point::new(-27.9, 25.6),
        ],
        original_coordinates: vec![Point::new(-27.9, 25.6), Point::new(-27.8, 25.7)],
    };
    let bytes = encode_part_file(&[block]).unwrap();
    assert_eq!(bytes.len(), RECORD_SIZE);
    assert_eq!(bytes[0], 0x01);
    assert_eq!(&bytes[1..3], &[0x0B, 0xB8]);
    assert_eq!(bytes[19], 0);
}

#[test]
fn truncated_part_file_is_rejected() {
    assert!(matches!(
        decode_part_file(&[0u8; 19]),
        Err(RateGridError::MalformedFile { len: 19, .. })
    ));
}

#[test]
fn second_block_on_same_cell_is_rejected() {
    let mut state = EditorState::with_settings(GridSettings::default()).unwrap();
    state.add_block(LAT, LNG, 10).unwrap();
    let before = state.grid().unwrap().cells().to_vec();
    assert!(matches!(
        state.add_block(LAT, LNG, 20),
        Err(RateGridError::DuplicateBlock(_))
    ));
    assert_eq!(state.blocks().len(), 1);
    assert_eq!(state.grid().unwrap().cells(), before.as_slice());
}
