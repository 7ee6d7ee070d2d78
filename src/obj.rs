use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use log::info;
use thiserror::Error;

use crate::model::{Material, MeshPart, Model, Shading, TextureKind, TextureRef, Vertex};

/// Failure modes of the model importer.
///
/// A failed load never yields a partially populated model; the error is
/// propagated to the caller as-is.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("material `{name}` is not defined by any material library")]
    UnknownMaterial { name: String },
    #[error("material `{name}` is missing its diffuse color")]
    MissingDiffuse { name: String },
    #[error("{} does not define any geometry", path.display())]
    EmptyModel { path: PathBuf },
}

/// Loads a model from an OBJ file, resolving its MTL material libraries
/// and texture references relative to the file's directory.
///
/// Faces are triangulated by fan; parts are split per `usemtl` group;
/// missing normals are computed from face geometry. Tangents and
/// bitangents are zero-filled when the source does not provide them.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Model, LoadError> {
    let path = path.as_ref();
    info!("loading model from {}", path.display());
    let data = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    load_from_str(&data, directory, &name, path)
}

/// Parses OBJ text directly; `path` is only used for error reporting and
/// `directory` anchors material library and texture lookups.
pub fn load_from_str(
    data: &str,
    directory: &Path,
    name: &str,
    path: &Path,
) -> Result<Model, LoadError> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut materials: HashMap<String, MtlEntry> = HashMap::new();
    let mut groups: Vec<FaceGroup> = Vec::new();
    let mut current: Option<usize> = None;

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        let parse_error = |message: String| LoadError::Parse {
            path: path.to_path_buf(),
            line: line_no + 1,
            message,
        };
        match tag {
            "v" => positions.push(parse_vec3(parts).map_err(parse_error)?),
            "vn" => normals.push(parse_vec3(parts).map_err(parse_error)?),
            "vt" => uvs.push(parse_vec2(parts).map_err(parse_error)?),
            "mtllib" => {
                for library in parts {
                    let library_path = directory.join(library);
                    load_mtl(&library_path, directory, &mut materials)?;
                }
            }
            "usemtl" => {
                let material = parts
                    .next()
                    .ok_or_else(|| parse_error("usemtl without a name".to_string()))?
                    .to_string();
                current = Some(group_index(&mut groups, Some(material)));
            }
            "f" => {
                let polygon = parse_face(parts).map_err(parse_error)?;
                let index = match current {
                    Some(index) => index,
                    None => {
                        let index = group_index(&mut groups, None);
                        current = Some(index);
                        index
                    }
                };
                triangulate_face(&polygon, &mut groups[index].faces);
            }
            _ => {}
        }
    }

    if positions.is_empty() || groups.iter().all(|group| group.faces.is_empty()) {
        return Err(LoadError::EmptyModel {
            path: path.to_path_buf(),
        });
    }

    let mut mesh_parts = Vec::with_capacity(groups.len());
    for group in &groups {
        let (material, textures) = match &group.material {
            Some(name) => {
                let entry = materials
                    .get(name)
                    .ok_or_else(|| LoadError::UnknownMaterial { name: name.clone() })?;
                if !entry.has_diffuse {
                    return Err(LoadError::MissingDiffuse { name: name.clone() });
                }
                (entry.material, entry.textures.clone())
            }
            None => (Material::default(), Vec::new()),
        };
        let mut part = build_part(&positions, &normals, &uvs, &group.faces, material, textures)
            .map_err(|message| LoadError::Parse {
                path: path.to_path_buf(),
                line: 0,
                message,
            })?;
        if needs_normals(&part.vertices) {
            compute_normals(&mut part);
        }
        mesh_parts.push(part);
    }

    info!(
        "loaded model `{name}` with {} part(s), {} position(s)",
        mesh_parts.len(),
        positions.len()
    );
    Ok(Model::new(name, mesh_parts, Shading::Lit))
}

#[derive(Debug, Default, Clone)]
struct MtlEntry {
    material: Material,
    has_diffuse: bool,
    textures: Vec<TextureRef>,
}

struct FaceGroup {
    material: Option<String>,
    faces: Vec<[FaceIndex; 3]>,
}

fn group_index(groups: &mut Vec<FaceGroup>, material: Option<String>) -> usize {
    if let Some(index) = groups.iter().position(|group| group.material == material) {
        return index;
    }
    groups.push(FaceGroup {
        material,
        faces: Vec::new(),
    });
    groups.len() - 1
}

fn load_mtl(
    path: &Path,
    directory: &Path,
    materials: &mut HashMap<String, MtlEntry>,
) -> Result<(), LoadError> {
    let data = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut current: Option<String> = None;
    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        let parse_error = |message: String| LoadError::Parse {
            path: path.to_path_buf(),
            line: line_no + 1,
            message,
        };
        if tag == "newmtl" {
            let name = parts
                .next()
                .ok_or_else(|| parse_error("newmtl without a name".to_string()))?;
            materials.insert(name.to_string(), MtlEntry::default());
            current = Some(name.to_string());
            continue;
        }
        let Some(name) = current.as_ref() else {
            return Err(parse_error(format!("`{tag}` before any newmtl")));
        };
        let entry = materials.get_mut(name).unwrap();
        match tag {
            "Ka" => entry.material.ambient = parse_vec3(parts).map_err(parse_error)?,
            "Kd" => {
                entry.material.diffuse = parse_vec3(parts).map_err(parse_error)?;
                entry.has_diffuse = true;
            }
            "Ks" => entry.material.specular = parse_vec3(parts).map_err(parse_error)?,
            "Ke" => entry.material.emissive = parse_vec3(parts).map_err(parse_error)?,
            "Ns" => {
                let value = parts
                    .next()
                    .ok_or_else(|| parse_error("Ns without a value".to_string()))?;
                entry.material.shininess = value
                    .parse::<f32>()
                    .map_err(|err| parse_error(format!("invalid shininess: {err}")))?;
            }
            "map_Kd" => push_texture(entry, TextureKind::Diffuse, parts, directory),
            "map_Ks" => push_texture(entry, TextureKind::Specular, parts, directory),
            _ => {}
        }
    }
    Ok(())
}

fn push_texture<'a>(
    entry: &mut MtlEntry,
    kind: TextureKind,
    parts: impl Iterator<Item = &'a str>,
    directory: &Path,
) {
    // The filename is the last token; options like -bm precede it.
    if let Some(filename) = parts.last() {
        let normalized = filename.replace('\\', "/");
        entry.textures.push(TextureRef {
            kind,
            path: directory.join(normalized),
        });
    }
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3, String> {
    let mut component = || -> Result<f32, String> {
        parts
            .next()
            .ok_or_else(|| "missing vector component".to_string())?
            .parse::<f32>()
            .map_err(|err| format!("invalid vector component: {err}"))
    };
    let x = component()?;
    let y = component()?;
    let z = component()?;
    Ok(Vec3::new(x, y, z))
}

fn parse_vec2<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<[f32; 2], String> {
    let mut component = || -> Result<f32, String> {
        parts
            .next()
            .ok_or_else(|| "missing texture coordinate".to_string())?
            .parse::<f32>()
            .map_err(|err| format!("invalid texture coordinate: {err}"))
    };
    Ok([component()?, component()?])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FaceIndex {
    v: i32,
    vt: i32,
    vn: i32,
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<FaceIndex>, String> {
    let mut indices = Vec::new();
    for part in parts {
        let mut segments = part.split('/');
        let v = segments
            .next()
            .ok_or_else(|| "missing vertex index".to_string())?
            .parse::<i32>()
            .map_err(|err| format!("invalid vertex index: {err}"))?;
        let vt = segments
            .next()
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<i32>().unwrap_or(0))
            .unwrap_or(0);
        let vn = segments
            .next()
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<i32>().unwrap_or(0))
            .unwrap_or(0);
        indices.push(FaceIndex { v, vt, vn });
    }
    if indices.len() < 3 {
        return Err("faces must reference at least 3 vertices".to_string());
    }
    Ok(indices)
}

fn triangulate_face(polygon: &[FaceIndex], faces: &mut Vec<[FaceIndex; 3]>) {
    for i in 1..(polygon.len() - 1) {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
}

fn build_part(
    positions: &[Vec3],
    normals: &[Vec3],
    uvs: &[[f32; 2]],
    faces: &[[FaceIndex; 3]],
    material: Material,
    textures: Vec<TextureRef>,
) -> Result<MeshPart, String> {
    let mut lookup: HashMap<FaceIndex, u32> = HashMap::new();
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for face in faces {
        for idx in face {
            let next_index = vertices.len() as u32;
            let entry = match lookup.get(idx) {
                Some(existing) => *existing,
                None => {
                    let position = fix_index(idx.v, positions.len())
                        .ok_or_else(|| format!("vertex index {} out of range", idx.v))?;
                    let normal = fix_index(idx.vn, normals.len())
                        .map(|i| normals[i])
                        .unwrap_or(Vec3::ZERO);
                    let uv = fix_index(idx.vt, uvs.len())
                        .map(|i| uvs[i])
                        .unwrap_or([0.0, 0.0]);
                    vertices.push(Vertex {
                        position: positions[position].into(),
                        normal: normal.into(),
                        uv,
                        ..Vertex::default()
                    });
                    lookup.insert(*idx, next_index);
                    next_index
                }
            };
            indices.push(entry);
        }
    }

    Ok(MeshPart {
        vertices,
        indices,
        material,
        textures,
    })
}

fn fix_index(index: i32, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = index as usize - 1;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let abs = (-index) as usize;
        (abs <= len).then_some(len - abs)
    } else {
        None
    }
}

fn needs_normals(vertices: &[Vertex]) -> bool {
    vertices.iter().any(|vertex| vertex.normal == [0.0; 3])
}

fn compute_normals(part: &mut MeshPart) {
    let mut accum = vec![Vec3::ZERO; part.vertices.len()];

    for triangle in part.indices.chunks_exact(3) {
        let i0 = triangle[0] as usize;
        let i1 = triangle[1] as usize;
        let i2 = triangle[2] as usize;
        let p0 = Vec3::from(part.vertices[i0].position);
        let p1 = Vec3::from(part.vertices[i1].position);
        let p2 = Vec3::from(part.vertices[i2].position);
        let normal = (p1 - p0).cross(p2 - p0);
        if normal.length_squared() > f32::EPSILON {
            let normal = normal.normalize();
            accum[i0] += normal;
            accum[i1] += normal;
            accum[i2] += normal;
        }
    }

    for (vertex, normal) in part.vertices.iter_mut().zip(accum) {
        vertex.normal = normal.normalize_or_zero().into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(obj: &str) -> Result<Model, LoadError> {
        load_from_str(obj, Path::new("."), "test", Path::new("test.obj"))
    }

    #[test]
    fn parses_a_simple_triangle() {
        let model = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(model.parts().len(), 1);
        assert_eq!(model.parts()[0].indices, vec![0, 1, 2]);
        assert_eq!(model.parts()[0].vertices.len(), 3);
        assert_eq!(model.shading(), Shading::Lit);
    }

    #[test]
    fn computes_missing_normals() {
        let model = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        for vertex in &model.parts()[0].vertices {
            let normal = Vec3::from(vertex.normal);
            assert!((normal.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn negative_indices_count_from_the_end() {
        let model = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n").unwrap();
        assert_eq!(model.parts()[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn quads_are_triangulated_by_fan() {
        let model = parse("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();
        assert_eq!(model.parts()[0].indices.len(), 6);
    }

    #[test]
    fn empty_file_is_an_error() {
        assert!(matches!(parse("# nothing\n"), Err(LoadError::EmptyModel { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = load_from_file("definitely/not/here.obj");
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn malformed_vertex_reports_the_line() {
        let result = parse("v 0 zero 0\nf 1 1 1\n");
        match result {
            Err(LoadError::Parse { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_material_is_an_error() {
        let result = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl ghost\nf 1 2 3\n");
        assert!(matches!(result, Err(LoadError::UnknownMaterial { .. })));
    }

    #[test]
    fn material_without_diffuse_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mtl_path = dir.path().join("parts.mtl");
        std::fs::write(&mtl_path, "newmtl shell\nKs 1 1 1\n").unwrap();
        let obj_path = dir.path().join("model.obj");
        let mut obj = std::fs::File::create(&obj_path).unwrap();
        write!(
            obj,
            "mtllib parts.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl shell\nf 1 2 3\n"
        )
        .unwrap();

        let result = load_from_file(&obj_path);
        assert!(matches!(result, Err(LoadError::MissingDiffuse { .. })));
    }

    #[test]
    fn materials_split_parts_and_resolve_textures() {
        let dir = tempfile::tempdir().unwrap();
        let mtl_path = dir.path().join("parts.mtl");
        std::fs::write(
            &mtl_path,
            "newmtl body\nKd 1 0 0\nNs 16\nmap_Kd skins\\body.png\nnewmtl trim\nKd 0 0 1\n",
        )
        .unwrap();
        let obj_path = dir.path().join("model.obj");
        std::fs::write(
            &obj_path,
            "mtllib parts.mtl\n\
             v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\n\
             usemtl body\nf 1 2 3\n\
             usemtl trim\nf 1 3 4\n",
        )
        .unwrap();

        let model = load_from_file(&obj_path).unwrap();
        assert_eq!(model.parts().len(), 2);

        let body = &model.parts()[0];
        assert_eq!(body.material.diffuse, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(body.material.shininess, 16.0);
        assert_eq!(body.textures.len(), 1);
        assert_eq!(body.textures[0].kind, TextureKind::Diffuse);
        assert_eq!(body.textures[0].path, dir.path().join("skins/body.png"));

        let trim = &model.parts()[1];
        assert_eq!(trim.material.diffuse, Vec3::new(0.0, 0.0, 1.0));
        assert!(trim.textures.is_empty());
    }

    #[test]
    fn uvs_are_attached_to_vertices() {
        let model = parse(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n",
        )
        .unwrap();
        assert_eq!(model.parts()[0].vertices[1].uv, [1.0, 0.0]);
    }
}
