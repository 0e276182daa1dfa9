pub const WELCOME: &str = "StudyMind: ask exam-style questions about your own PDFs. Type `help` for commands.";

pub const HELP: &str = "\
Documents
  upload <path>        upload a PDF and track its processing
  rm <name>            delete one uploaded PDF
  reset                delete every uploaded PDF
  files                show tracked uploads
  status               list every document the server knows about

Chat
  ask <question>       ask a question (bare text works too)
  history              show the conversation so far
  clear                start a fresh conversation

Study panel
  marks <3|5|12>       answer length: short, medium or long
  study on|off         toggle syllabus context (off clears it)
  context <text>       set syllabus context text
  context clear        remove syllabus context
  syllabus <path>      extract syllabus context from a PDF or DOCX

  help                 this list
  tutorial             a short walkthrough
  quit                 leave";

pub const TUTORIAL: &str = "\
1. Upload your study materials
   `upload lectures/week1.pdf`. Lecture notes, textbooks or any PDF up to 50MB.
   Wait until the file shows `completed` before asking. Upload several PDFs to
   search across all of them at once.

2. Configure study settings
   `study on` and then `context ...` or `syllabus <file>` focuses answers on your
   course outline. Pick the answer length for your exam format:
     3 marks  = ~100 words (quick facts)
     5 marks  = ~250 words (explained)
     12 marks = ~500 words (detailed)

3. Ask questions
   Type any question about your material. Be specific. Try `explain`,
   `compare`, `list` or `summarize`. Every answer cites the pages it used.

4. Follow up naturally
   Ask `explain more`, `give an example` or `what about ...`. Recent turns are
   sent along as context. Use `clear` to start fresh.";
