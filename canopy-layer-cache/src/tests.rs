use crate::{
    merge, CacheWriter, CachingPolicy, Error, LayerFactory, LayerReader, LayerWriter, Node,
    Result, SliceLayer, NODE_SIZE,
};

// Layer double reporting a fixed width; reads fail with an injected error.
struct WidthLayer {
    width: u64,
}

impl LayerReader for WidthLayer {
    fn seek(&mut self, _index: u64) -> Result<()> {
        Ok(())
    }

    fn read_next(&mut self) -> Result<Node> {
        Err(Error::Layer("some error".into()))
    }

    fn width(&self) -> Result<u64> {
        Ok(self.width)
    }
}

impl LayerWriter for WidthLayer {
    fn append(&mut self, _node: &[u8]) -> Result<()> {
        unimplemented!()
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

fn writer_with_widths(widths: &[u64]) -> CacheWriter {
    let mut writer = CacheWriter::default();
    for (height, width) in widths.iter().enumerate() {
        writer.set_layer(height as u32, Box::new(WidthLayer { width: *width }));
    }
    writer
}

#[test]
fn test_validate_structure_requires_base_layer() {
    let err = CacheWriter::default().into_reader().unwrap_err();
    assert_eq!(err.to_string(), "reader for base layer must be included");
}

#[test]
fn test_validate_structure_rejects_empty_base_layer() {
    let err = writer_with_widths(&[0]).into_reader().unwrap_err();
    assert_eq!(err.to_string(), "base layer cannot be empty");
}

#[test]
fn test_validate_structure_success() {
    writer_with_widths(&[4, 2, 1]).into_reader().unwrap();
}

#[test]
fn test_validate_structure_success_with_gaps() {
    let mut writer = CacheWriter::default();
    writer.set_layer(0, Box::new(WidthLayer { width: 8 }));
    writer.set_layer(2, Box::new(WidthLayer { width: 2 }));
    writer.into_reader().unwrap();
}

#[test]
fn test_validate_structure_width_mismatch() {
    let err = writer_with_widths(&[3, 2, 1]).into_reader().unwrap_err();
    assert_eq!(err.to_string(), "reader at layer 1 has width 2 instead of 1");
}

#[test]
fn test_validate_structure_width_mismatch2() {
    let err = writer_with_widths(&[4, 1, 1]).into_reader().unwrap_err();
    assert_eq!(err.to_string(), "reader at layer 1 has width 1 instead of 2");
}

#[test]
fn test_layer_writer_respects_policy() {
    let mut writer = CacheWriter::new(CachingPolicy::MinHeight(2), LayerFactory::Slice);
    assert!(writer.layer_writer(0).unwrap().is_none());
    assert!(writer.layer_writer(1).unwrap().is_none());
    assert!(writer.layer_writer(2).unwrap().is_some());
    assert!(writer.layer_writer(5).unwrap().is_some());
}

#[test]
fn test_layer_writer_reuses_created_layer() {
    let mut writer = CacheWriter::new(
        CachingPolicy::specific_layers([0]),
        LayerFactory::Slice,
    );
    writer
        .layer_writer(0)
        .unwrap()
        .expect("layer admitted")
        .append(&[1u8; NODE_SIZE])
        .unwrap();
    writer
        .layer_writer(0)
        .unwrap()
        .expect("layer admitted")
        .append(&[2u8; NODE_SIZE])
        .unwrap();

    let mut reader = writer.into_reader().unwrap();
    let layer = reader.layer_reader(0).expect("base layer cached");
    assert_eq!(layer.width().unwrap(), 2);
    assert_eq!(layer.read_next().unwrap(), vec![1u8; NODE_SIZE]);
    assert_eq!(layer.read_next().unwrap(), vec![2u8; NODE_SIZE]);
}

#[test]
fn test_fixed_factory_yields_each_layer_once() {
    let mut factory = LayerFactory::fixed(0, Box::new(SliceLayer::new()));
    let mut writer = CacheWriter::new(CachingPolicy::MinHeight(0), factory);
    assert!(writer.layer_writer(0).unwrap().is_some());
    assert!(writer.layer_writer(1).unwrap().is_none());

    // a fresh writer asking twice gets the layer only the first time
    factory = LayerFactory::fixed(3, Box::new(SliceLayer::new()));
    assert!(factory.create(3).unwrap().is_some());
    assert!(factory.create(3).unwrap().is_none());
}

#[test]
fn test_file_factory_creates_layer_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = CacheWriter::new(
        CachingPolicy::specific_layers([0, 1]),
        LayerFactory::file(dir.path()),
    );
    writer
        .layer_writer(0)
        .unwrap()
        .expect("layer admitted")
        .append(&[3u8; NODE_SIZE])
        .unwrap();
    writer
        .layer_writer(1)
        .unwrap()
        .expect("layer admitted")
        .append(&[4u8; NODE_SIZE])
        .unwrap();
    drop(writer);

    assert!(dir.path().join("layer-0.bin").exists());
    assert!(dir.path().join("layer-1.bin").exists());
}

fn slice_cache(heights_and_nodes: &[(u32, &[Node])]) -> CacheWriter {
    let mut writer = CacheWriter::default();
    for (height, nodes) in heights_and_nodes {
        writer.set_layer(*height, Box::new(SliceLayer::from_nodes(nodes.to_vec())));
    }
    writer
}

fn nodes_of(values: &[u8]) -> Vec<Node> {
    values.iter().map(|v| vec![*v; NODE_SIZE]).collect()
}

#[test]
fn test_merge_concatenates_layers_per_height() {
    let first = slice_cache(&[
        (0, &nodes_of(&[0, 1, 2, 3])[..]),
        (1, &nodes_of(&[10, 11])[..]),
    ])
    .into_reader()
    .unwrap();
    let second = slice_cache(&[
        (0, &nodes_of(&[4, 5, 6, 7])[..]),
        (1, &nodes_of(&[12, 13])[..]),
    ])
    .into_reader()
    .unwrap();

    let mut merged = merge(vec![first, second]).unwrap();

    let base = merged.layer_reader(0).expect("base layer");
    assert_eq!(base.width().unwrap(), 8);
    base.seek(0).unwrap();
    for v in 0u8..8 {
        assert_eq!(base.read_next().unwrap(), vec![v; NODE_SIZE]);
    }

    let layer1 = merged.layer_reader(1).expect("layer 1");
    assert_eq!(layer1.width().unwrap(), 4);
    layer1.seek(2).unwrap();
    assert_eq!(layer1.read_next().unwrap(), vec![12u8; NODE_SIZE]);
}

#[test]
fn test_merge_requires_two_caches() {
    let only = slice_cache(&[(0, &nodes_of(&[0, 1])[..])])
        .into_reader()
        .unwrap();
    let err = merge(vec![only]).unwrap_err();
    assert_eq!(err.to_string(), "number of caches must be at least 2");
}

#[test]
fn test_merge_rejects_uneven_heights() {
    let first = slice_cache(&[
        (0, &nodes_of(&[0, 1])[..]),
        (1, &nodes_of(&[10])[..]),
    ])
    .into_reader()
    .unwrap();
    let second = slice_cache(&[(0, &nodes_of(&[2, 3])[..])])
        .into_reader()
        .unwrap();
    let err = merge(vec![first, second]).unwrap_err();
    assert_eq!(err.to_string(), "number of layers per height mismatch");
}
