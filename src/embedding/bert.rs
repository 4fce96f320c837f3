//! Candle BERT sentence embedder.
//!
//! Runs MiniLM-class sentence transformers locally with attention-mask-aware
//! mean pooling and L2 normalization, matching sentence-transformers output.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use crate::domain::ModelId;
use crate::embedding::{EmbeddingError, EmbeddingProvider, ModelType, Result};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";

struct Loaded {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// Transformer embedding provider backed by candle.
#[derive(Clone)]
pub struct BertProvider {
    model_type: ModelType,
    model: ModelId,
    inner: Arc<Loaded>,
}

impl BertProvider {
    /// Loads weights for `model_type` from `model_dir`, or from the Hugging
    /// Face hub cache when no directory is given.
    pub async fn load(model_type: ModelType, model_dir: Option<PathBuf>) -> Result<Self> {
        let loaded = tokio::task::spawn_blocking(move || -> anyhow::Result<Loaded> {
            let dir = match model_dir {
                Some(dir) => dir,
                None => fetch_from_hub(model_type)?,
            };
            load_dir(&dir)
        })
        .await
        .map_err(|e| EmbeddingError::Model(e.to_string()))?
        .map_err(|e| EmbeddingError::Model(format!("{e:#}")))?;

        Ok(Self {
            model_type,
            model: model_type.model_id(),
            inner: Arc::new(loaded),
        })
    }
}

fn fetch_from_hub(model_type: ModelType) -> anyhow::Result<PathBuf> {
    let repo_id = model_type
        .hf_model_id()
        .ok_or_else(|| anyhow!("{:?} has no hub weights", model_type))?;

    let api = hf_hub::api::sync::Api::new().context("create hub client")?;
    let repo = api.model(repo_id.to_string());

    let mut dir = None;
    for file in [CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE] {
        let path = repo
            .get(file)
            .with_context(|| format!("download {file} from {repo_id}"))?;
        dir = path.parent().map(Path::to_path_buf);
    }
    dir.ok_or_else(|| anyhow!("hub cache path for {repo_id} has no parent"))
}

fn load_dir(dir: &Path) -> anyhow::Result<Loaded> {
    let device = Device::Cpu;

    let config_path = dir.join(CONFIG_FILE);
    let config_str = std::fs::read_to_string(&config_path)
        .with_context(|| format!("read {}", config_path.display()))?;
    let config: BertConfig = serde_json::from_str(&config_str)
        .with_context(|| format!("parse {}", config_path.display()))?;

    let weights_path = dir.join(WEIGHTS_FILE);
    // SAFETY: the weights file is memory-mapped read-only and not modified
    // while the model is alive.
    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&[weights_path.clone()], DType::F32, &device)
            .with_context(|| format!("load weights from {}", weights_path.display()))?
    };
    let model = BertModel::load(vb, &config).context("load BERT model")?;

    let tokenizer = Tokenizer::from_file(dir.join(TOKENIZER_FILE))
        .map_err(|e| anyhow!("load tokenizer: {e}"))?;

    tracing::info!(
        dir = %dir.display(),
        hidden_size = config.hidden_size,
        layers = config.num_hidden_layers,
        "Embedding model loaded"
    );

    Ok(Loaded {
        model,
        tokenizer,
        device,
    })
}

impl Loaded {
    fn embed(&self, text: &str, max_len: usize) -> anyhow::Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("tokenize: {e}"))?;

        let len = encoding.get_ids().len().min(max_len);
        let ids: Vec<i64> = encoding.get_ids()[..len].iter().map(|&id| id as i64).collect();
        let mask: Vec<i64> = encoding.get_attention_mask()[..len]
            .iter()
            .map(|&m| m as i64)
            .collect();

        let ids = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let mask = Tensor::new(mask.as_slice(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = ids.zeros_like()?;

        let hidden = self.model.forward(&ids, &token_type_ids, Some(&mask))?;
        let pooled = mean_pooling(&hidden, &mask)?;
        let normalized = l2_normalize(&pooled)?;

        Ok(normalized.squeeze(0)?.to_vec1()?)
    }
}

/// Averages hidden states over non-padding positions.
///
/// `hidden`: `[batch, seq_len, hidden]`, `mask`: `[batch, seq_len]`.
fn mean_pooling(hidden: &Tensor, mask: &Tensor) -> anyhow::Result<Tensor> {
    let mask = mask
        .to_dtype(DType::F32)?
        .unsqueeze(2)?
        .broadcast_as(hidden.shape())?;
    let summed = (hidden * &mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
    Ok((summed / counts)?)
}

fn l2_normalize(tensor: &Tensor) -> anyhow::Result<Tensor> {
    let norm = tensor.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
    Ok(tensor.broadcast_div(&norm)?)
}

#[async_trait]
impl EmbeddingProvider for BertProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dimension()]);
        }

        let input = match self.model_type.document_prefix() {
            Some(prefix) => format!("{prefix}{text}"),
            None => text.to_string(),
        };
        let inner = Arc::clone(&self.inner);
        let max_len = self.model_type.max_seq_length();
        let expected = self.dimension();

        let vector = tokio::task::spawn_blocking(move || inner.embed(&input, max_len))
            .await
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?
            .map_err(|e| EmbeddingError::Inference(format!("{e:#}")))?;

        if vector.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }

    fn model(&self) -> &ModelId {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.model_type.embedding_dim()
    }
}

impl std::fmt::Debug for BertProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertProvider")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}
