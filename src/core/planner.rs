//! # Test Combination Planner Module / 测试组合计划模块
//!
//! This module expands the four configured axes into the flat, ordered list
//! of test combinations the runner executes.
//!
//! 此模块将四个配置轴展开为运行器执行的扁平有序测试组合列表。

use anyhow::{bail, Result};

use crate::core::config::SuiteConfig;
use crate::core::models::Combination;
use crate::infra::t;

/// Represents a complete execution plan for a suite.
/// 表示测试套件的完整执行计划。
#[derive(Debug)]
pub struct ExecutionPlan {
    /// Combinations in execution order / 按执行顺序排列的组合
    pub combinations: Vec<Combination>,
    /// Entry counts of the image, location, person and pipeline axes.
    /// 图片、地点、人物和管线轴的条目数。
    pub axis_sizes: [usize; 4],
}

impl ExecutionPlan {
    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }
}

/// Computes the Cartesian product of the four axes.
///
/// The image list axis is the outer-most loop and the pipeline config axis the
/// inner-most; each axis is walked in document order. Nothing is filtered or
/// deduplicated, and unset prompt values become empty strings.
///
/// 计算四个轴的笛卡尔积。
/// 图片列表轴为最外层循环，管线配置轴为最内层循环；每个轴按文档顺序遍历。
/// 不做任何过滤或去重，未设置的提示词值变为空字符串。
pub fn generate_combinations(config: &SuiteConfig) -> Vec<Combination> {
    let capacity = config.image_lists.len()
        * config.location_prompts.len()
        * config.person_prompts.len()
        * config.pipeline_configs.len();
    let mut combinations = Vec::with_capacity(capacity);

    for (img_key, images) in config.image_lists.iter() {
        for (loc_key, location) in config.location_prompts.iter() {
            for (person_key, person) in config.person_prompts.iter() {
                for (pipe_key, pipeline) in config.pipeline_configs.iter() {
                    combinations.push(Combination {
                        test_id: format!("{img_key}_{loc_key}_{person_key}_{pipe_key}"),
                        image_list_key: img_key.to_string(),
                        image_list_name: images.name.clone(),
                        image_list_description: images.description.clone(),
                        image_urls: images.urls.clone(),
                        location_prompt_key: loc_key.to_string(),
                        location_prompt_name: location.name.clone(),
                        location_prompt_value: location.value().to_string(),
                        person_prompt_key: person_key.to_string(),
                        person_prompt_name: person.name.clone(),
                        person_prompt_value: person.value().to_string(),
                        pipeline_config_key: pipe_key.to_string(),
                        pipeline_config_name: pipeline.name.clone(),
                        pipeline_config_filename: pipeline.filename.clone(),
                    });
                }
            }
        }
    }

    combinations
}

/// Creates the execution plan for a suite.
///
/// # Errors
/// Returns an error when any axis is empty, since no combination can be formed.
pub fn plan_execution(config: &SuiteConfig) -> Result<ExecutionPlan> {
    let combinations = generate_combinations(config);
    if combinations.is_empty() {
        bail!("{}", t!("plan.no_combinations"));
    }

    Ok(ExecutionPlan {
        combinations,
        axis_sizes: [
            config.image_lists.len(),
            config.location_prompts.len(),
            config.person_prompts.len(),
            config.pipeline_configs.len(),
        ],
    })
}
