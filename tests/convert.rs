mod common;

use serde_json::{Value, json};
use std::sync::Arc;

use common::{Shape, ZipBuilder, data_url, dbf, shp};
use geoingest::geometry::type_name;
use geoingest::{
    ConversionError, Feature, Format, GeometryValue, MemoryReader, ReadAt, convert,
    convert_bytes, convert_source,
};

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap()
}

fn name(feature: &Feature) -> &str {
    feature.property("name").and_then(Value::as_str).unwrap()
}

#[tokio::test]
async fn unknown_extension_lists_supported_formats() {
    let err = convert(Some("data.xyz"), Some("data:;base64,AAAA"), None)
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, ConversionError::UnsupportedFormat { .. }));
    for ext in [".geojson", ".kml", ".kmz", ".gpx", ".csv", ".zip"] {
        assert!(message.contains(ext), "{message} lacks {ext}");
    }
}

#[tokio::test]
async fn csv_upload_through_data_url() {
    let csv = b"lat,lon,name\n40.7,-74.0,NYC\n";
    let conversion = convert(Some("cities.csv"), Some(&data_url("text/csv", csv)), Some("text/csv"))
        .await
        .unwrap();

    assert_eq!(conversion.format, Format::Csv);
    assert_eq!(
        to_value(&conversion.collection),
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-74.0, 40.7]},
                "properties": {"name": "NYC"}
            }]
        })
    );
}

#[tokio::test]
async fn csv_rows_with_bad_coordinates_are_skipped() {
    let fc = convert_bytes("pts.csv", b"latitude,longitude\nabc,1\n2,3\n".to_vec())
        .await
        .unwrap();
    assert_eq!(fc.features.len(), 1);
    assert_eq!(
        to_value(&fc.features[0].geometry),
        json!({"type": "Point", "coordinates": [3.0, 2.0]})
    );
}

#[tokio::test]
async fn csv_without_longitude_column() {
    let err = convert_bytes("pts.csv", b"lat,name\n1,a\n".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConversionError::MissingCoordinateColumns { missing: "longitude" }
    ));
}

#[tokio::test]
async fn single_and_multiple_kml_placemarks() {
    let one = br#"<kml><Document><Placemark><name>A</name><Point><coordinates>1,2</coordinates></Point></Placemark></Document></kml>"#;
    let fc = convert_bytes("one.kml", one.to_vec()).await.unwrap();
    assert_eq!(fc.features.len(), 1);
    assert_eq!(name(&fc.features[0]), "A");

    let two = br#"<kml><Document>
        <Placemark><name>A</name><Point><coordinates>1,2</coordinates></Point></Placemark>
        <Placemark><name>B</name><Point><coordinates>3,4</coordinates></Point></Placemark>
    </Document></kml>"#;
    let fc = convert_bytes("two.kml", two.to_vec()).await.unwrap();
    let names: Vec<_> = fc.features.iter().map(name).collect();
    assert_eq!(names, ["A", "B"]);
}

#[tokio::test]
async fn kml_placemarks_and_folders_interleave_in_document_order() {
    let doc = br#"<kml><Document>
        <Placemark><name>A</name><Point><coordinates>1,1</coordinates></Point></Placemark>
        <Folder>
          <Placemark><name>B</name><Point><coordinates>2,2</coordinates></Point></Placemark>
          <Document>
            <Placemark><name>C</name><Point><coordinates>3,3</coordinates></Point></Placemark>
          </Document>
        </Folder>
        <Placemark><name>D</name><Point><coordinates>4,4</coordinates></Point></Placemark>
        <Folder>
          <Placemark><name>E</name><Point><coordinates>5,5</coordinates></Point></Placemark>
        </Folder>
    </Document></kml>"#;
    let fc = convert_bytes("mixed.kml", doc.to_vec()).await.unwrap();
    let names: Vec<_> = fc.features.iter().map(name).collect();
    assert_eq!(names, ["A", "B", "C", "D", "E"]);
}

#[tokio::test]
async fn geojson_output_is_stable_under_reconversion() {
    let input = json!({
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}, "properties": {"k": 1}},
            {"type": "Feature", "geometry": null, "properties": null}
        ]
    });
    let first = convert_bytes("in.geojson", serde_json::to_vec(&input).unwrap())
        .await
        .unwrap();
    let second = convert_bytes("again.json", serde_json::to_vec(&first).unwrap())
        .await
        .unwrap();
    assert_eq!(to_value(&first), to_value(&second));
}

#[tokio::test]
async fn geojson_keeps_bbox_foreign_members_and_altitude() {
    let input = json!({
        "type": "FeatureCollection",
        "bbox": [-1.0, -1.0, 1.0, 1.0],
        "features": [{
            "type": "Feature",
            "title": "summit",
            "bbox": [1.0, 1.0, 1.0, 1.0],
            "geometry": {"type": "Point", "coordinates": [1.0, 1.0, 25.0]},
            "properties": {"ele": 25}
        }]
    });
    let content = data_url(
        "application/geo+json",
        &serde_json::to_vec(&input).unwrap(),
    );
    let conversion = convert(Some("peaks.geojson"), Some(&content), None)
        .await
        .unwrap();

    assert_eq!(conversion.format, Format::GeoJson);
    assert_eq!(to_value(&conversion.collection), input);
}

#[tokio::test]
async fn gpx_waypoints_then_tracks_then_routes() {
    let gpx = br#"<?xml version="1.0"?>
    <gpx version="1.1" xmlns="http://www.topografix.com/GPX/1/1">
      <rte><name>R</name><rtept lat="5" lon="6"/><rtept lat="7" lon="8"/></rte>
      <trk><name>T</name><trkseg><trkpt lat="1" lon="2"/><trkpt lat="3" lon="4"/></trkseg></trk>
      <wpt lat="10" lon="20"><name>W</name></wpt>
    </gpx>"#;
    let fc = convert_bytes("walk.gpx", gpx.to_vec()).await.unwrap();
    let kinds: Vec<_> = fc
        .features
        .iter()
        .map(|f| type_name(f.geometry.as_ref().unwrap()))
        .collect();
    assert_eq!(kinds, ["Point", "LineString", "LineString"]);
    assert_eq!(
        to_value(&fc.features[0].geometry),
        json!({"type": "Point", "coordinates": [20.0, 10.0]})
    );
    assert_eq!(name(&fc.features[2]), "R");
}

#[tokio::test]
async fn gpx_with_one_bare_waypoint() {
    let gpx = br#"<gpx version="1.1"><wpt lat="51.5" lon="-0.12"/></gpx>"#;
    let fc = convert_bytes("pin.gpx", gpx.to_vec()).await.unwrap();
    assert_eq!(
        to_value(&fc),
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-0.12, 51.5]},
                "properties": {}
            }]
        })
    );
}

#[tokio::test]
async fn kmz_reads_first_kml_member() {
    let kml = br#"<kml><Placemark><name>Inside</name><Point><coordinates>7,8</coordinates></Point></Placemark></kml>"#;
    let archive = ZipBuilder::new()
        .stored("images/icon.png", b"\x89PNG")
        .deflated("doc.kml", kml)
        .build();

    let fc = convert_bytes("site.kmz", archive).await.unwrap();
    assert_eq!(fc.features.len(), 1);
    assert_eq!(name(&fc.features[0]), "Inside");
}

#[tokio::test]
async fn kmz_upload_through_data_url() {
    let kml = br#"<kml><Document><Placemark><name>Upload</name><LineString><coordinates>1,2 3,4</coordinates></LineString></Placemark></Document></kml>"#;
    let archive = ZipBuilder::new()
        .directory("files/")
        .deflated("files/doc.kml", kml)
        .build();
    let content = data_url("application/vnd.google-earth.kmz", &archive);

    let conversion = convert(Some("route.KMZ"), Some(&content), None)
        .await
        .unwrap();
    assert_eq!(conversion.format, Format::Kmz);
    assert_eq!(conversion.collection.features.len(), 1);
    assert_eq!(name(&conversion.collection.features[0]), "Upload");
    assert_eq!(
        to_value(&conversion.collection.features[0].geometry),
        json!({"type": "LineString", "coordinates": [[1.0, 2.0], [3.0, 4.0]]})
    );
}

#[tokio::test]
async fn kmz_without_kml_member() {
    let archive = ZipBuilder::new().stored("readme.txt", b"hi").build();
    let err = convert_bytes("site.kmz", archive).await.unwrap_err();
    assert!(matches!(err, ConversionError::NoMarkupMemberInArchive));
}

#[tokio::test]
async fn zipped_shapefile_with_attributes() {
    let geometry = shp(1, &[Shape::Point(10.0, 20.0), Shape::Point(-3.5, 51.25)]);
    let table = dbf(
        &[("NAME", 'C', 10, 0), ("POP", 'N', 8, 0)],
        &[&["Alpha", "120"], &["Beta", ""]],
    );
    let archive = ZipBuilder::new()
        .directory("towns/")
        .deflated("towns/towns.shp", &geometry)
        .stored("towns/towns.shx", b"index")
        .deflated("towns/towns.dbf", &table)
        .build();

    let fc = convert_bytes("towns.zip", archive).await.unwrap();
    assert_eq!(
        to_value(&fc),
        json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [10.0, 20.0]}, "properties": {"NAME": "Alpha", "POP": 120}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-3.5, 51.25]}, "properties": {"NAME": "Beta", "POP": null}}
            ]
        })
    );
}

#[tokio::test]
async fn shapefile_dates_flags_and_decimals() {
    let geometry = shp(1, &[Shape::Point(1.0, 2.0)]);
    let table = dbf(
        &[
            ("SURVEYED", 'D', 8, 0),
            ("ACTIVE", 'L', 1, 0),
            ("AREA", 'N', 10, 2),
        ],
        &[&["20240315", "T", "12.75"]],
    );
    let archive = ZipBuilder::new()
        .stored("plots.shp", &geometry)
        .stored("plots.dbf", &table)
        .build();

    let fc = convert_bytes("plots.zip", archive).await.unwrap();
    assert_eq!(
        fc.features[0].properties,
        Some(
            json!({"SURVEYED": "2024-03-15", "ACTIVE": true, "AREA": 12.75})
                .as_object()
                .unwrap()
                .clone()
        )
    );
}

#[tokio::test]
async fn shapefile_without_table_has_empty_properties() {
    // Clockwise outer ring with a counter-clockwise hole
    let outer = vec![(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0), (0.0, 0.0)];
    let hole = vec![(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 4.0), (2.0, 2.0)];
    let geometry = shp(5, &[Shape::Parts(vec![outer, hole]), Shape::Null]);
    let archive = ZipBuilder::new().stored("lots.shp", &geometry).build();

    let fc = convert_bytes("lots.zip", archive).await.unwrap();
    assert_eq!(fc.features.len(), 2);
    match &fc.features[0].geometry.as_ref().unwrap().value {
        GeometryValue::Polygon(rings) => assert_eq!(rings.len(), 2),
        other => panic!("expected polygon, got {other:?}"),
    }
    assert_eq!(fc.features[0].properties, Some(Default::default()));
    assert!(fc.features[1].geometry.is_none());
}

#[tokio::test]
async fn multi_part_polyline_becomes_multilinestring() {
    let geometry = shp(
        3,
        &[Shape::Parts(vec![
            vec![(0.0, 0.0), (1.0, 1.0)],
            vec![(5.0, 5.0), (6.0, 6.0)],
        ])],
    );
    let archive = ZipBuilder::new().deflated("roads.shp", &geometry).build();
    let fc = convert_bytes("roads.zip", archive).await.unwrap();
    assert_eq!(
        to_value(&fc.features[0].geometry),
        json!({"type": "MultiLineString", "coordinates": [[[0.0, 0.0], [1.0, 1.0]], [[5.0, 5.0], [6.0, 6.0]]]})
    );
}

#[tokio::test]
async fn zip_without_shp_member() {
    let archive = ZipBuilder::new().stored("towns.dbf", b"table").build();
    let err = convert_bytes("towns.zip", archive).await.unwrap_err();
    assert!(matches!(err, ConversionError::NoGeometryRecordFileInArchive));
}

#[tokio::test]
async fn shapefile_record_count_mismatch_fails() {
    let geometry = shp(1, &[Shape::Point(1.0, 2.0)]);
    let table = dbf(&[("ID", 'N', 4, 0)], &[&["1"], &["2"]]);
    let archive = ZipBuilder::new()
        .stored("a.shp", &geometry)
        .stored("a.dbf", &table)
        .build();

    let err = convert_bytes("a.zip", archive).await.unwrap_err();
    assert!(matches!(err, ConversionError::GeometryRecordDecodeFailure(_)));
    assert!(err.to_string().contains("1 geometry records but 2 attribute rows"), "{err}");
}

#[tokio::test]
async fn garbage_geometry_member_is_a_decode_failure() {
    let archive = ZipBuilder::new()
        .stored("a.shp", b"definitely not a shapefile")
        .build();
    let err = convert_bytes("a.zip", archive).await.unwrap_err();
    assert!(matches!(err, ConversionError::GeometryRecordDecodeFailure(_)));
}

#[tokio::test]
async fn corrupted_member_fails_crc_check() {
    let geometry = shp(1, &[Shape::Point(1.0, 2.0)]);
    let archive = ZipBuilder::new()
        .deflated("a.shp", &geometry)
        .with_bad_crc()
        .build();

    let err = convert_bytes("a.zip", archive).await.unwrap_err();
    assert!(matches!(err, ConversionError::Archive(_)));
    assert!(err.to_string().contains("CRC"), "{err}");
}

#[tokio::test]
async fn zip64_sizes_past_the_end_of_the_archive_are_rejected() {
    let geometry = shp(1, &[Shape::Point(1.0, 2.0)]);
    let archive = ZipBuilder::new()
        .stored("a.shp", &geometry)
        .with_zip64_sizes(1 << 50, 1 << 50)
        .build();

    let err = convert_bytes("a.zip", archive).await.unwrap_err();
    assert!(matches!(err, ConversionError::Archive(_)));
    assert!(err.to_string().contains("past the end"), "{err}");
}

#[tokio::test]
async fn zip64_sizes_within_the_archive_are_honoured() {
    let geometry = shp(1, &[Shape::Point(1.0, 2.0)]);
    let archive = ZipBuilder::new()
        .stored("a.shp", &geometry)
        .with_zip64_sizes(geometry.len() as u64, geometry.len() as u64)
        .build();

    let fc = convert_bytes("a.zip", archive).await.unwrap();
    assert_eq!(
        to_value(&fc.features[0].geometry),
        json!({"type": "Point", "coordinates": [1.0, 2.0]})
    );
}

#[tokio::test]
async fn inflating_past_the_declared_size_fails() {
    let geometry = shp(1, &[Shape::Point(1.0, 2.0)]);
    let archive = ZipBuilder::new()
        .deflated("a.shp", &geometry)
        .with_declared_size(16)
        .build();

    let err = convert_bytes("a.zip", archive).await.unwrap_err();
    assert!(matches!(err, ConversionError::Archive(_)));
    assert!(
        err.to_string().contains("decompressed to 17 bytes, expected 16"),
        "{err}"
    );
}

#[tokio::test]
async fn truncated_zip_is_an_archive_error() {
    let err = convert_bytes("a.zip", b"PK\x03\x04 not really".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, ConversionError::Archive(_)));
}

#[tokio::test]
async fn convert_source_reads_any_random_access_source() {
    let reader: Arc<dyn ReadAt> = Arc::new(MemoryReader::new(
        br#"{"type":"Point","coordinates":[1,2]}"#.to_vec(),
    ));
    let fc = convert_source(Format::GeoJson, reader).await.unwrap();
    assert_eq!(fc.features.len(), 1);
    assert_eq!(fc.features[0].properties, Some(Default::default()));
}
