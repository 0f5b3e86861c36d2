//! Scene library descriptors.
//!
//! Each descriptor pairs a rendering library with the system prompt that
//! steers the model toward emitting runnable scene code for it. Prompts ask
//! for a single fenced code block followed by the run token so the extractor
//! and the host renderer can find the code deterministically.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A supported 3D/WebXR rendering library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneLibrary {
    /// Stable identifier, used in messages and conversations.
    pub id: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Fence tag the model is asked to use for code blocks.
    pub language_tag: &'static str,
    /// System prompt sent with every completion request.
    pub system_prompt: &'static str,
    /// Minimal scene shown before the first response arrives.
    pub default_scene: &'static str,
}

/// All supported libraries. The first entry is the default.
pub const LIBRARIES: &[SceneLibrary] = &[
    SceneLibrary {
        id: "babylon",
        display_name: "Babylon.js",
        language_tag: "javascript",
        system_prompt: "You write Babylon.js scene code. Assume `engine`, `canvas` \
and a `createScene()` entry point; build and return a BABYLON.Scene. Use only \
the core babylonjs package. Respond with a short explanation, then exactly one \
fenced ```javascript block containing the complete scene code, then the token \
[RUN_SCENE] on its own line. Never split the code across multiple blocks.",
        default_scene: "const createScene = () => {\n  const scene = new BABYLON.Scene(engine);\n  new BABYLON.ArcRotateCamera('cam', Math.PI / 2, Math.PI / 3, 8, BABYLON.Vector3.Zero(), scene).attachControl(canvas, true);\n  new BABYLON.HemisphericLight('light', new BABYLON.Vector3(0, 1, 0), scene);\n  BABYLON.MeshBuilder.CreateGround('ground', { width: 6, height: 6 }, scene);\n  return scene;\n};\n",
    },
    SceneLibrary {
        id: "three",
        display_name: "Three.js",
        language_tag: "javascript",
        system_prompt: "You write Three.js scene code. Assume `renderer`, `scene` \
and `camera` already exist; add objects, lights and an animation loop via \
`renderer.setAnimationLoop`. Respond with a short explanation, then exactly one \
fenced ```javascript block containing the complete scene code, then the token \
[RUN_SCENE] on its own line. Never split the code across multiple blocks.",
        default_scene: "const geometry = new THREE.BoxGeometry(1, 1, 1);\nconst material = new THREE.MeshStandardMaterial({ color: 0x44aa88 });\nconst cube = new THREE.Mesh(geometry, material);\nscene.add(cube);\nscene.add(new THREE.DirectionalLight(0xffffff, 1));\nrenderer.setAnimationLoop(() => {\n  cube.rotation.y += 0.01;\n  renderer.render(scene, camera);\n});\n",
    },
    SceneLibrary {
        id: "aframe",
        display_name: "A-Frame",
        language_tag: "html",
        system_prompt: "You write A-Frame WebXR scenes as HTML. Emit a complete \
<a-scene> element with entities, assets and components inline. Respond with a \
short explanation, then exactly one fenced ```html block containing the complete \
scene markup, then the token [RUN_SCENE] on its own line. Never split the code \
across multiple blocks.",
        default_scene: "<a-scene>\n  <a-box position=\"-1 0.5 -3\" rotation=\"0 45 0\" color=\"#4CC3D9\"></a-box>\n  <a-sphere position=\"0 1.25 -5\" radius=\"1.25\" color=\"#EF2D5E\"></a-sphere>\n  <a-plane position=\"0 0 -4\" rotation=\"-90 0 0\" width=\"4\" height=\"4\" color=\"#7BC8A4\"></a-plane>\n  <a-sky color=\"#ECECEC\"></a-sky>\n</a-scene>\n",
    },
    SceneLibrary {
        id: "react-three-fiber",
        display_name: "React Three Fiber",
        language_tag: "jsx",
        system_prompt: "You write React Three Fiber scene components. Export a \
default function component that renders inside an existing <Canvas>; use hooks \
from @react-three/fiber and helpers from @react-three/drei. Respond with a short \
explanation, then exactly one fenced ```jsx block containing the complete \
component, then the token [RUN_SCENE] on its own line. Never split the code \
across multiple blocks.",
        default_scene: "export default function Scene() {\n  return (\n    <>\n      <ambientLight intensity={0.5} />\n      <directionalLight position={[5, 5, 5]} />\n      <mesh rotation={[0.4, 0.6, 0]}>\n        <boxGeometry args={[1, 1, 1]} />\n        <meshStandardMaterial color=\"orange\" />\n      </mesh>\n    </>\n  );\n}\n",
    },
    SceneLibrary {
        id: "reactylon",
        display_name: "Reactylon",
        language_tag: "tsx",
        system_prompt: "You write Reactylon scene components: React components \
that declare Babylon.js scenes. Export a default function component using \
Reactylon's JSX elements (box, sphere, hemisphericLight, arcRotateCamera). \
Respond with a short explanation, then exactly one fenced ```tsx block \
containing the complete component, then the token [RUN_SCENE] on its own line. \
Never split the code across multiple blocks.",
        default_scene: "export default function Scene() {\n  return (\n    <>\n      <arcRotateCamera name=\"cam\" alpha={Math.PI / 2} beta={Math.PI / 3} radius={8} target={Vector3.Zero()} />\n      <hemisphericLight name=\"light\" direction={new Vector3(0, 1, 0)} />\n      <box name=\"box\" size={2} position={new Vector3(0, 1, 0)} />\n    </>\n  );\n}\n",
    },
];

static LIBRARY_INDEX: Lazy<HashMap<&'static str, &'static SceneLibrary>> =
    Lazy::new(|| LIBRARIES.iter().map(|lib| (lib.id, lib)).collect());

/// Look up a library by id.
pub fn library_by_id(id: &str) -> Option<&'static SceneLibrary> {
    LIBRARY_INDEX.get(id).copied()
}

/// The library used when a conversation does not pin one.
pub fn default_library() -> &'static SceneLibrary {
    &LIBRARIES[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_libraries_indexed() {
        for lib in LIBRARIES {
            assert_eq!(library_by_id(lib.id).unwrap().id, lib.id);
        }
        assert!(library_by_id("unity").is_none());
    }

    #[test]
    fn test_default_library_is_babylon() {
        assert_eq!(default_library().id, "babylon");
    }

    #[test]
    fn test_ids_unique() {
        assert_eq!(LIBRARY_INDEX.len(), LIBRARIES.len());
    }

    #[test]
    fn test_prompts_request_run_token() {
        for lib in LIBRARIES {
            assert!(
                lib.system_prompt.contains("[RUN_SCENE]"),
                "{} prompt missing run token",
                lib.id
            );
            assert!(lib.system_prompt.contains(lib.language_tag));
        }
    }

    #[test]
    fn test_default_scenes_nonempty() {
        for lib in LIBRARIES {
            assert!(!lib.default_scene.trim().is_empty());
        }
    }

    #[test]
    fn test_prompts_share_formatting_rules() {
        for lib in LIBRARIES {
            assert!(lib
                .system_prompt
                .ends_with("Never split the code across multiple blocks."));
        }
    }
}
