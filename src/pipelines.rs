//! Built-in pipeline presets.

use serde_json::json;
use umami_pipeline::{Binding, PipelineDefinition, Stage};

/// Twice a day: 02:00 and 11:00 UTC.
pub const RECIPE_CRON: &str = "0 0 2,11 * * *";

/// The recipe publishing pipeline: invent a dish, render four candidate
/// images in parallel, pick the best one, compose the title card, publish.
pub fn recipe_pipeline() -> PipelineDefinition {
  PipelineDefinition::new(
    "recipe",
    "recipe publishing",
    vec![
      Stage::task("GenText", "gen_text", "GenTextResults", [
        ("DryRun", Binding::path("DryRun")),
      ]),
      Stage::fan_out(
        "GenImg",
        "gen_img",
        4,
        "ParallelIndex",
        "ParallelGenImgResults",
        [
          ("DishName", Binding::path("GenTextResults.DishName")),
          ("Theme", Binding::path("GenTextResults.Theme")),
          ("ExecName", Binding::execution_id()),
          ("DryRun", Binding::path("DryRun")),
        ],
      ),
      Stage::task("SelectImg", "select_img", "SelectImgResults", [
        ("Candidates", Binding::path("ParallelGenImgResults")),
        ("DishName", Binding::path("GenTextResults.DishName")),
        ("DryRun", Binding::path("DryRun")),
      ]),
      Stage::task("EditImg", "edit_img", "EditImgResults", [
        ("ImgKey", Binding::path("SelectImgResults.ImgKey")),
        ("DishName", Binding::path("GenTextResults.DishName")),
        (
          "OutKey",
          Binding::format("{}/titled.png", vec![Binding::artifact_token()]),
        ),
        ("DryRun", Binding::path("DryRun")),
      ]),
      Stage::terminal("PubImg", "pub_img", [
        ("ImgKey", Binding::path("EditImgResults.ImgKey")),
        ("DishName", Binding::path("GenTextResults.DishName")),
        ("Genres", Binding::path("GenTextResults.Genres")),
        ("MainFood", Binding::path("GenTextResults.MainFood")),
        ("Theme", Binding::path("GenTextResults.Theme")),
        ("Ingredients", Binding::path("GenTextResults.Ingredients")),
        ("Steps", Binding::path("GenTextResults.Steps")),
        ("DryRun", Binding::path("DryRun")),
      ]),
    ],
    600_000,
  )
}

/// The seed document every recipe execution starts from.
pub fn recipe_seed(dry_run: bool) -> serde_json::Value {
  json!({"DryRun": dry_run})
}
