//! Built-in model path table, used when the configuration has no
//! `[MODEL_PATHS]` section.
//!
//! The categories and their directories are fixed for compatibility:
//! downstream tooling compares generated documents against this exact
//! table, including the order of categories and of directories within a
//! block. Categories that commonly hold large downloaded weights also
//! search the persistent volume.

/// Default category table: category name -> newline-joined search block.
pub(crate) fn default_model_paths(comfyui_dir: &str, volume: &str) -> Vec<(String, String)> {
    let table = [
        (
            "checkpoints",
            format!("{comfyui_dir}/models/checkpoints\n{volume}/checkpoints"),
        ),
        (
            "clip",
            format!("{comfyui_dir}/models/clip\n{volume}/text_encoders"),
        ),
        ("clip_vision", format!("{comfyui_dir}/models/clip_vision")),
        ("configs", format!("{comfyui_dir}/models/configs")),
        ("controlnet", format!("{comfyui_dir}/models/controlnet")),
        (
            "diffusion_models",
            format!("{comfyui_dir}/models/diffusion_models\n{volume}/diffusion_models"),
        ),
        ("embeddings", format!("{comfyui_dir}/models/embeddings")),
        ("gligen", format!("{comfyui_dir}/models/gligen")),
        (
            "hypernetworks",
            format!("{comfyui_dir}/models/hypernetworks"),
        ),
        ("inpaint", format!("{comfyui_dir}/models/inpaint")),
        (
            "loras",
            format!("{comfyui_dir}/models/loras\n{volume}/loras"),
        ),
        ("sampling", format!("{comfyui_dir}/models/sampling")),
        (
            "upscale_models",
            format!("{comfyui_dir}/models/upscale_models"),
        ),
        ("vae", format!("{comfyui_dir}/models/vae\n{volume}/vae")),
        ("vae_approx", format!("{comfyui_dir}/models/vae_approx")),
    ];
    table
        .into_iter()
        .map(|(category, block)| (category.to_string(), block))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_has_fifteen_categories_in_order() {
        let table = default_model_paths("/app", "/vol");
        let categories: Vec<&str> = table.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(
            categories,
            vec![
                "checkpoints",
                "clip",
                "clip_vision",
                "configs",
                "controlnet",
                "diffusion_models",
                "embeddings",
                "gligen",
                "hypernetworks",
                "inpaint",
                "loras",
                "sampling",
                "upscale_models",
                "vae",
                "vae_approx",
            ]
        );
    }

    #[test]
    fn test_vae_searches_base_then_volume() {
        let table = default_model_paths("/app", "/vol");
        let vae = &table.iter().find(|(c, _)| c == "vae").unwrap().1;
        assert_eq!(vae, "/app/models/vae\n/vol/vae");
    }

    #[test]
    fn test_clip_volume_directory_is_text_encoders() {
        let table = default_model_paths("/app", "/vol");
        let clip = &table.iter().find(|(c, _)| c == "clip").unwrap().1;
        assert_eq!(clip, "/app/models/clip\n/vol/text_encoders");
    }

    #[test]
    fn test_single_directory_categories() {
        let table = default_model_paths("/app", "/vol");
        for category in ["clip_vision", "configs", "controlnet", "embeddings", "vae_approx"] {
            let block = &table.iter().find(|(c, _)| c == category).unwrap().1;
            assert_eq!(block, &format!("/app/models/{category}"));
        }
    }
}
