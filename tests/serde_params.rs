// Copyright 2025 Lars Brubaker
// JSON (de)serialization of surfaces.

mod helpers;

use cstar_surface::{CStarSurface, Case, SurfaceParams};
use helpers::*;

#[test]
fn surface_serializes_as_plain_parameters() {
    let json = serde_json::to_value(e6_cubic()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "l": [[3, 1], [3], [2]],
            "d": [[-2, -1], [1], [1]],
            "case": "ee"
        })
    );
}

#[test]
fn json_round_trip_for_every_case() {
    for x in all_cases() {
        let text = serde_json::to_string(&x).unwrap();
        let y: CStarSurface = serde_json::from_str(&text).unwrap();
        assert_eq!(y, x);
        assert_eq!(y.intersection_matrix(), x.intersection_matrix());
    }
}

#[test]
fn deserialization_validates() {
    let text = r#"{"l": [[2], [1]], "d": [[4], [0]], "case": "pp"}"#;
    let err = serde_json::from_str::<CStarSurface>(text).unwrap_err();
    assert!(err.to_string().contains("not coprime"), "{}", err);

    let text = r#"{"l": [[1], [1]], "d": [[0], [0]], "case": "xx"}"#;
    assert!(serde_json::from_str::<CStarSurface>(text).is_err());
}

#[test]
fn params_convert_back() {
    let params = SurfaceParams {
        l: vec![vec![1, 1], vec![1]],
        d: vec![vec![1, 0], vec![0]],
        case: Case::Pp,
    };
    let x = CStarSurface::try_from(params.clone()).unwrap();
    assert_eq!(x, smooth_pp());
    assert_eq!(x.params(), params);
}
