use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rayon::prelude::*;
use serde_json::json;

use crate::assets::codec::ImageCodecs;
use crate::assets::format::mime_type_for_extension;
use crate::assets::transcode::{TranscodedImage, transcode_image};
use crate::document::model::Document;
use crate::document::passes::{DefaultGraphPasses, ElementKind, GraphPasses};
use crate::foundation::error::{StowError, StowResult};

use super::naming;
use super::options::{ResourceKind, WriteOptions};
use super::sinks::{BufferStorage, ResourceOutputs, WriteTarget};
use super::strategy::{
    Representation, ResourceRequest, ResourceSlot, WriteState, choose_representation, externalize,
};

/// Extension name attached to textures whose image was encoded to KTX2.
pub const KHR_TEXTURE_BASISU: &str = "KHR_texture_basisu";

const BUFFER_EXTENSION: &str = ".bin";
const SHADER_EXTENSION: &str = ".glsl";

/// Externalizes every pending resource of a document.
///
/// Order: images (transcoded in parallel, applied in index order), shaders, unreachable
/// bufferView/buffer pruning, buffer merge, buffers, then texture extension rewrites. The first
/// error aborts the write; the document may be partially mutated at that point.
pub struct ResourceWriter<'a> {
    options: &'a WriteOptions,
    codecs: &'a dyn ImageCodecs,
    passes: &'a dyn GraphPasses,
}

impl<'a> ResourceWriter<'a> {
    /// Writer using [`DefaultGraphPasses`].
    pub fn new(options: &'a WriteOptions, codecs: &'a dyn ImageCodecs) -> Self {
        Self {
            options,
            codecs,
            passes: &DefaultGraphPasses,
        }
    }

    /// Replace the graph passes run before the buffer pass.
    pub fn with_passes(mut self, passes: &'a dyn GraphPasses) -> Self {
        self.passes = passes;
        self
    }

    #[tracing::instrument(
        skip_all,
        fields(
            images = doc.images.len(),
            shaders = doc.shaders.len(),
            buffers = doc.buffers.len()
        )
    )]
    /// Run the full write over `doc`.
    pub fn write(&self, doc: &mut Document) -> StowResult<ResourceOutputs> {
        self.options.validate()?;

        let mut state = WriteState::default();
        let mut storage = self.options.buffer_storage.then(BufferStorage::default);

        let ktx2_images = self.write_images(doc, &mut state)?;
        self.write_shaders(doc, &mut state);

        self.passes
            .remove_unreachable(doc, &[ElementKind::BufferView, ElementKind::Buffer])?;
        self.passes
            .merge_buffers(doc, self.options.name.as_deref())?;

        self.write_buffers(doc, &mut state, &mut storage)?;
        attach_texture_basisu(doc, &ktx2_images);

        tracing::debug!(
            separate = state.separate.len(),
            deduplicated = state.written.len(),
            "resources written"
        );
        Ok(ResourceOutputs {
            separate_resources: state.separate,
            buffer_storage: storage,
        })
    }

    /// Transcode and externalize images. Returns the indices of images that ended up as KTX2.
    fn write_images(&self, doc: &mut Document, state: &mut WriteState) -> StowResult<HashSet<usize>> {
        // One transcode job per identity; images without an id get their own job.
        let mut jobs: Vec<Arc<Vec<u8>>> = Vec::new();
        let mut job_for_image: Vec<Option<usize>> = vec![None; doc.images.len()];
        let mut job_by_id: HashMap<String, usize> = HashMap::new();
        for (i, image) in doc.images.iter().enumerate() {
            let Some(pending) = image.pending.as_ref() else {
                continue;
            };
            let shared = pending
                .resource_id
                .as_deref()
                .and_then(|id| job_by_id.get(id).copied());
            let job = match shared {
                Some(job) => job,
                None => {
                    let job = jobs.len();
                    jobs.push(Arc::clone(&pending.source));
                    if let Some(id) = pending.resource_id.as_deref() {
                        job_by_id.insert(id.to_string(), job);
                    }
                    job
                }
            };
            job_for_image[i] = Some(job);
        }
        if jobs.is_empty() {
            return Ok(HashSet::new());
        }

        let transcoded = self.transcode_all(&jobs)?;

        let representation = choose_representation(
            self.options.separates(ResourceKind::Image),
            self.options.data_uris,
        );
        let doc_name = self.options.name.as_deref();
        let mut ktx2_images = HashSet::new();
        for (i, job) in job_for_image.into_iter().enumerate() {
            let Some(job) = job else {
                continue;
            };
            let Some(pending) = doc.images[i].pending.take() else {
                continue;
            };
            let image = &transcoded[job];
            let extension = image.extension();
            let name = naming::image_name(doc_name, &doc.images[i], i);
            let relative_path = pending
                .relative_path
                .as_deref()
                .map(|p| naming::replace_extension(p, extension));
            let request = ResourceRequest {
                source: &image.source,
                resource_id: pending.resource_id.as_deref(),
                relative_path: relative_path.as_deref(),
                name: &name,
                extension,
            };
            let target = externalize(doc, state, &request, representation);

            let entity = &mut doc.images[i];
            entity.apply_target(&target);
            // Required for bufferViews; a carried one follows the final format.
            if matches!(target, WriteTarget::BufferView(_)) || entity.mime_type.is_some() {
                entity.mime_type = Some(mime_type_for_extension(extension).to_string());
            }
            if image.format.is_gpu_container() {
                ktx2_images.insert(i);
            }
            tracing::debug!(image = i, extension, "image externalized");
        }

        if !ktx2_images.is_empty() {
            doc.use_extension(KHR_TEXTURE_BASISU, true);
        }
        Ok(ktx2_images)
    }

    fn transcode_all(&self, jobs: &[Arc<Vec<u8>>]) -> StowResult<Vec<TranscodedImage>> {
        let transcode_opts = self.options.transcode_options();
        let codecs = self.codecs;
        let pool = build_thread_pool(self.options.threads)?;
        let results = pool.install(|| {
            jobs.par_iter()
                .map(|source| transcode_image(Arc::clone(source), &transcode_opts, codecs))
                .collect::<Vec<_>>()
        });

        let mut transcoded = Vec::with_capacity(results.len());
        for result in results {
            transcoded.push(result?);
        }
        Ok(transcoded)
    }

    fn write_shaders(&self, doc: &mut Document, state: &mut WriteState) {
        let representation = choose_representation(
            self.options.separates(ResourceKind::Shader),
            self.options.data_uris,
        );
        let doc_name = self.options.name.as_deref();
        for i in 0..doc.shaders.len() {
            let Some(pending) = doc.shaders[i].pending.take() else {
                continue;
            };
            let name = naming::shader_name(doc, doc_name, i);
            let request = ResourceRequest {
                source: &pending.source,
                resource_id: pending.resource_id.as_deref(),
                relative_path: pending.relative_path.as_deref(),
                name: &name,
                extension: SHADER_EXTENSION,
            };
            let target = externalize(doc, state, &request, representation);
            doc.shaders[i].apply_target(&target);
        }
    }

    fn write_buffers(
        &self,
        doc: &mut Document,
        state: &mut WriteState,
        storage: &mut Option<BufferStorage>,
    ) -> StowResult<()> {
        let separate = self.options.separates(ResourceKind::Buffer);
        let representation = if separate {
            Representation::SeparateFile
        } else {
            Representation::DataUri
        };
        let doc_name = self.options.name.as_deref();
        for i in 0..doc.buffers.len() {
            let Some(pending) = doc.buffers[i].pending.take() else {
                continue;
            };
            if !separate && let Some(storage) = storage.as_mut() {
                let offset = storage.append(&pending.source);
                tracing::debug!(buffer = i, offset, "buffer appended to storage");
                continue;
            }

            let name = naming::buffer_name(doc_name, &doc.buffers[i], i);
            let request = ResourceRequest {
                source: &pending.source,
                resource_id: pending.resource_id.as_deref(),
                relative_path: pending.relative_path.as_deref(),
                name: &name,
                extension: BUFFER_EXTENSION,
            };
            match externalize(doc, state, &request, representation) {
                WriteTarget::Uri(uri) => doc.buffers[i].uri = Some(uri),
                WriteTarget::BufferView(view) => {
                    return Err(StowError::validation(format!(
                        "buffer {i} shares its resource id with bufferView {view}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Externalize every pending resource of `doc` with the default graph passes.
pub fn write_resources(
    doc: &mut Document,
    options: &WriteOptions,
    codecs: &dyn ImageCodecs,
) -> StowResult<ResourceOutputs> {
    ResourceWriter::new(options, codecs).write(doc)
}

/// Move `source` of textures pointing at KTX2 images into `extensions.KHR_texture_basisu`.
fn attach_texture_basisu(doc: &mut Document, ktx2_images: &HashSet<usize>) {
    if ktx2_images.is_empty() {
        return;
    }
    for texture in &mut doc.textures {
        let Some(source) = texture.source else {
            continue;
        };
        if !ktx2_images.contains(&source) {
            continue;
        }
        texture
            .extensions
            .insert(KHR_TEXTURE_BASISU.to_string(), json!({ "source": source }));
        texture.source = None;
    }
}

fn build_thread_pool(threads: Option<usize>) -> StowResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(StowError::validation(
            "transcode 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| StowError::transcode(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/write/orchestrator.rs"]
mod tests;
