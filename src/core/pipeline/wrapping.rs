/// Marker replaced with the escaped user script when the wrapper
/// template is rendered. Never present in the rendered output.
const USER_CODE_MARKER: &str = "@@USER_CODE@@";

/// The program run inside the sandbox. It executes the embedded user
/// code in a fresh namespace, captures stdio, and prints exactly one
/// JSON object on its own stdout. That line is the only contract
/// between the wrapper and the result decoder.
const WRAPPER_TEMPLATE: &str = r#"import json
import io
import traceback
from contextlib import redirect_stdout, redirect_stderr

user_code = @@USER_CODE@@

try:
    stdout_buffer = io.StringIO()
    stderr_buffer = io.StringIO()
    namespace = {'__name__': '__main__', '__builtins__': __builtins__}

    with redirect_stdout(stdout_buffer), redirect_stderr(stderr_buffer):
        exec(user_code, namespace)

        if 'main' not in namespace:
            raise Exception("No main() function found")

        result = namespace['main']()

        try:
            json.dumps(result)
        except (TypeError, ValueError) as json_error:
            error_type = type(result).__name__
            raise Exception(
                "main() function must return JSON serializable data. "
                "Got %s: %s" % (error_type, str(json_error))
            )

    response = {
        'success': True,
        'result': result,
        'stdout': stdout_buffer.getvalue().rstrip(),
        'stderr': stderr_buffer.getvalue().rstrip()
    }

except Exception as e:
    response = {
        'success': False,
        'error': str(e),
        'traceback': traceback.format_exc(),
        'stdout': stdout_buffer.getvalue().rstrip() if 'stdout_buffer' in locals() else '',
        'stderr': stderr_buffer.getvalue().rstrip() if 'stderr_buffer' in locals() else ''
    }

print(json.dumps(response, default=str))
"#;

/// Builds the self-contained wrapper program for one submission.
///
/// The submitted text is embedded as an opaque string literal, escaped
/// so the wrapper reproduces it byte-for-byte regardless of its own
/// quoting or content. The wrapper is not evaluated here; it only runs
/// inside the sandbox executor.
pub fn build_wrapper(script: &str) -> String {
    WRAPPER_TEMPLATE.replacen(USER_CODE_MARKER, &python_string_literal(script), 1)
}

/// Renders `text` as a double-quoted Python string literal that
/// evaluates back to exactly `text`.
fn python_string_literal(text: &str) -> String {
    let mut literal = String::with_capacity(text.len() + 2);
    literal.push('"');
    for c in text.chars() {
        match c {
            '\\' => literal.push_str("\\\\"),
            '"' => literal.push_str("\\\""),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                literal.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => literal.push(c),
        }
    }
    literal.push('"');
    literal
}
